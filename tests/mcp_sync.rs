use std::fs;

use serde_json::{json, Value};
use serial_test::serial;

use cli_sync_lib::{
    compute_checksum, AppError, DriftStatus, FileSnapshotBackup, McpService, McpSetItem,
    McpSetPatch, SnapshotBackup, SyncService, SyncStrategy,
};

#[path = "support.rs"]
mod support;
use support::{create_test_state, create_test_state_with_backup, file_backup, seed_definition};

fn read_json(path: &std::path::Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).expect("read target")).expect("parse target")
}

#[test]
fn overwrite_writes_exactly_the_set() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = create_test_state(Vec::new());
    let fs_def = seed_definition(&state, "fs", "npx", &["-y", "@mcp/fs"]);
    let set = McpService::create_set(&state, "S", vec![McpSetItem::new(&fs_def.id)], None)
        .expect("create set");

    let target = dir.path().join("cfg.json");
    fs::write(&target, r#"{"mcpServers":{"stale":{"command":"old"}}}"#).expect("seed");

    let applied = SyncService::sync_one_mcp(
        &state,
        "toolA",
        &target,
        None,
        SyncStrategy::Overwrite,
        &set.id,
    )
    .expect("sync");

    assert_eq!(applied, vec!["fs".to_string()]);
    assert_eq!(
        read_json(&target),
        json!({"mcpServers": {"fs": {"command": "npx", "args": ["-y", "@mcp/fs"]}}})
    );
}

#[test]
fn append_into_toml_keeps_existing_tables_and_fields() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = create_test_state(Vec::new());
    let new_def = seed_definition(&state, "new", "npx", &["-y", "@mcp/new"]);
    let set = McpService::create_set(&state, "S", vec![McpSetItem::new(&new_def.id)], None)
        .expect("create set");

    let target = dir.path().join("cfg.toml");
    fs::write(
        &target,
        "model = \"gpt-4o\"\n\n[mcp_servers.old]\ncommand = \"node\"\n",
    )
    .expect("seed");

    let applied =
        SyncService::sync_one_mcp(&state, "codex", &target, None, SyncStrategy::Append, &set.id)
            .expect("sync");

    let output = fs::read_to_string(&target).expect("read");
    assert_eq!(applied, vec!["new".to_string()]);
    assert!(output.contains("model = \"gpt-4o\""), "{output}");
    assert!(output.contains("[mcp_servers.old]"), "{output}");
    assert!(output.contains("[mcp_servers.new]"), "{output}");
    assert!(output.contains("command = \"node\""), "{output}");
}

#[test]
fn deep_merge_keeps_tool_specific_fields() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = create_test_state(Vec::new());
    let fs_def = seed_definition(&state, "fs", "npx", &["-y", "@mcp/fs"]);
    let set = McpService::create_set(&state, "S", vec![McpSetItem::new(&fs_def.id)], None)
        .expect("create set");

    let target = dir.path().join("settings.json");
    fs::write(
        &target,
        serde_json::to_string_pretty(&json!({
            "theme": "dark",
            "mcpServers": {
                "fs": {"command": "node", "timeout": 30000, "trust": true},
                "mine": {"command": "mine"}
            }
        }))
        .expect("serialize"),
    )
    .expect("seed");

    SyncService::sync_one_mcp(&state, "gemini", &target, None, SyncStrategy::DeepMerge, &set.id)
        .expect("sync");

    assert_eq!(
        read_json(&target),
        json!({
            "theme": "dark",
            "mcpServers": {
                "fs": {"command": "npx", "timeout": 30000, "trust": true, "args": ["-y", "@mcp/fs"]},
                "mine": {"command": "mine"}
            }
        })
    );
}

#[test]
fn selection_is_intersected_with_the_set() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = create_test_state(Vec::new());
    let a = seed_definition(&state, "a", "cmd-a", &[]);
    let b = seed_definition(&state, "b", "cmd-b", &[]);
    let c = seed_definition(&state, "c", "cmd-c", &[]);
    let set = McpService::create_set(
        &state,
        "S",
        vec![
            McpSetItem::new(&a.id),
            McpSetItem::new(&b.id),
            McpSetItem::new(&c.id),
        ],
        None,
    )
    .expect("create set");

    let target = dir.path().join("cfg.json");
    let selected = vec!["c".to_string(), "ghost".to_string(), "a".to_string()];
    let applied = SyncService::sync_one_mcp(
        &state,
        "toolA",
        &target,
        Some(selected.as_slice()),
        SyncStrategy::Overwrite,
        &set.id,
    )
    .expect("sync");

    assert_eq!(applied, vec!["a".to_string(), "c".to_string()]);
    let servers = read_json(&target)["mcpServers"].clone();
    assert_eq!(
        servers.as_object().expect("object").keys().collect::<Vec<_>>(),
        vec!["a", "c"]
    );
}

#[test]
fn empty_selection_and_empty_set_leave_file_untouched() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = create_test_state(Vec::new());
    let a = seed_definition(&state, "a", "cmd-a", &[]);
    let mut item = McpSetItem::new(&a.id);
    item.disabled = true;
    let all_disabled =
        McpService::create_set(&state, "disabled", vec![item], None).expect("create set");
    let with_a = McpService::create_set(&state, "with-a", vec![McpSetItem::new(&a.id)], None)
        .expect("create set");

    let target = dir.path().join("cfg.json");
    fs::write(&target, "{\"keep\": true}\n").expect("seed");

    let applied = SyncService::sync_one_mcp(
        &state,
        "toolA",
        &target,
        None,
        SyncStrategy::Overwrite,
        &all_disabled.id,
    )
    .expect("sync disabled set");
    assert!(applied.is_empty());

    let nothing: Vec<String> = vec!["ghost".into()];
    let applied = SyncService::sync_one_mcp(
        &state,
        "toolA",
        &target,
        Some(nothing.as_slice()),
        SyncStrategy::Overwrite,
        &with_a.id,
    )
    .expect("sync empty selection");
    assert!(applied.is_empty());

    assert_eq!(fs::read_to_string(&target).expect("read"), "{\"keep\": true}\n");
    assert_eq!(
        SyncService::check_drift(&state, &target).expect("drift"),
        DriftStatus::Untracked
    );
}

#[test]
fn unknown_source_and_malformed_target_fail_fast() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = create_test_state(Vec::new());
    let a = seed_definition(&state, "a", "cmd-a", &[]);
    let set = McpService::create_set(&state, "S", vec![McpSetItem::new(&a.id)], None)
        .expect("create set");

    let target = dir.path().join("cfg.json");
    let err = SyncService::sync_one_mcp(&state, "t", &target, None, SyncStrategy::Append, "nope")
        .expect_err("unknown set");
    assert!(matches!(err, AppError::NotFound(_)));

    fs::write(&target, "{ not json").expect("seed");
    let err = SyncService::sync_one_mcp(&state, "t", &target, None, SyncStrategy::Append, &set.id)
        .expect_err("malformed");
    assert!(matches!(err, AppError::Format { .. }), "{err}");
    assert!(err.to_string().contains("JSON"), "{err}");
    assert_eq!(fs::read_to_string(&target).expect("read"), "{ not json");
}

#[test]
fn sync_records_checksum_and_reports_drift() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = create_test_state(Vec::new());
    let a = seed_definition(&state, "a", "cmd-a", &[]);
    let set = McpService::create_set(&state, "S", vec![McpSetItem::new(&a.id)], None)
        .expect("create set");
    let target = dir.path().join("nested").join("cfg.json");

    SyncService::sync_one_mcp(&state, "t", &target, None, SyncStrategy::Append, &set.id)
        .expect("sync");

    let written = fs::read_to_string(&target).expect("read");
    let record = state
        .db
        .get_sync_state(&target.display().to_string())
        .expect("state")
        .expect("recorded");
    assert_eq!(record.last_sync_hash, compute_checksum(&written));
    assert_eq!(
        SyncService::check_drift(&state, &target).expect("drift"),
        DriftStatus::Clean
    );

    fs::write(&target, format!("{written} ")).expect("external edit");
    assert_eq!(
        SyncService::check_drift(&state, &target).expect("drift"),
        DriftStatus::Drifted
    );

    // drift never blocks the next write
    SyncService::sync_one_mcp(&state, "t", &target, None, SyncStrategy::Append, &set.id)
        .expect("sync over drift");
    assert_eq!(
        SyncService::check_drift(&state, &target).expect("drift"),
        DriftStatus::Clean
    );

    fs::remove_file(&target).expect("remove");
    assert_eq!(
        SyncService::check_drift(&state, &target).expect("drift"),
        DriftStatus::Missing
    );
}

#[test]
fn existing_target_is_snapshotted_before_write() {
    let dir = tempfile::tempdir().expect("tempdir");
    let backup = file_backup(dir.path());
    let state = create_test_state_with_backup(Vec::new(), backup.clone());
    let a = seed_definition(&state, "a", "cmd-a", &[]);
    let set = McpService::create_set(&state, "S", vec![McpSetItem::new(&a.id)], None)
        .expect("create set");

    let target = dir.path().join("cfg.json");
    SyncService::sync_one_mcp(&state, "t", &target, None, SyncStrategy::Append, &set.id)
        .expect("first sync");
    assert!(backup.list_snapshots().expect("list").is_empty(), "nothing to back up yet");

    let first = fs::read_to_string(&target).expect("read");
    let b = seed_definition(&state, "b", "cmd-b", &[]);
    McpService::update_set(
        &state,
        &set.id,
        McpSetPatch {
            items: Some(vec![McpSetItem::new(&a.id), McpSetItem::new(&b.id)]),
            ..Default::default()
        },
    )
    .expect("update set");
    SyncService::sync_one_mcp(&state, "t", &target, None, SyncStrategy::Append, &set.id)
        .expect("second sync");

    let snapshots = backup.list_snapshots().expect("list");
    assert_eq!(snapshots.len(), 1);
    assert_eq!(fs::read_to_string(&snapshots[0].stored).expect("stored"), first);

    backup.restore(&snapshots[0]).expect("restore");
    assert_eq!(fs::read_to_string(&target).expect("read"), first);
}

#[test]
fn backup_failure_does_not_abort_sync() {
    let dir = tempfile::tempdir().expect("tempdir");
    // backup root is a regular file, so every snapshot fails
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "x").expect("seed blocker");
    let backup = std::sync::Arc::new(FileSnapshotBackup::new(blocker.join("backups"), 3));
    let state = create_test_state_with_backup(Vec::new(), backup);
    let a = seed_definition(&state, "a", "cmd-a", &[]);
    let set = McpService::create_set(&state, "S", vec![McpSetItem::new(&a.id)], None)
        .expect("create set");

    let target = dir.path().join("cfg.json");
    fs::write(&target, "{}").expect("seed");

    let applied =
        SyncService::sync_one_mcp(&state, "t", &target, None, SyncStrategy::Append, &set.id)
            .expect("sync despite failing backup");
    assert_eq!(applied, vec!["a".to_string()]);
    assert!(read_json(&target)["mcpServers"]["a"].is_object());
}

#[test]
#[serial]
fn bare_file_name_target_lands_in_working_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = create_test_state(Vec::new());
    let a = seed_definition(&state, "a", "cmd-a", &[]);
    let set = McpService::create_set(&state, "S", vec![McpSetItem::new(&a.id)], None)
        .expect("create set");

    let previous = std::env::current_dir().expect("cwd");
    std::env::set_current_dir(dir.path()).expect("enter tempdir");
    let applied = SyncService::sync_one_mcp(
        &state,
        "t",
        std::path::Path::new("cfg.json"),
        None,
        SyncStrategy::Overwrite,
        &set.id,
    );
    std::env::set_current_dir(previous).expect("restore cwd");

    assert_eq!(applied.expect("sync to bare name"), vec!["a".to_string()]);
    assert_eq!(
        read_json(&dir.path().join("cfg.json")),
        json!({"mcpServers": {"a": {"command": "cmd-a", "args": []}}})
    );
}
