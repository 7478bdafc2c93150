use std::fs;

use serde_json::Value;

use cli_sync_lib::{
    AppSettings, McpService, McpSetItem, RuleService, SyncConfig, SyncKind, SyncService,
    SyncStatus, SyncStrategy, FLEET_TOOL_ID,
};

#[path = "support.rs"]
mod support;
use support::{create_test_state, json_tool, rules_only_tool, seed_definition, toml_tool};

fn statuses(results: &[cli_sync_lib::SyncResult]) -> Vec<(&str, SyncStatus)> {
    results
        .iter()
        .map(|r| (r.tool_id.as_str(), r.status))
        .collect()
}

#[test]
fn fleet_without_source_returns_single_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = create_test_state(vec![json_tool("a", dir.path())]);

    for source in [None, Some(""), Some("   ")] {
        let results = SyncService::sync_fleet_mcp(&state, source, &[], SyncStrategy::Append);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].tool_id, FLEET_TOOL_ID);
        assert_eq!(results[0].status, SyncStatus::Error);
        assert!(results[0].message.is_some());
    }

    let rules = SyncService::sync_fleet_rules(&state, None, SyncStrategy::Append, None);
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].status, SyncStatus::Error);

    assert!(state.db.list_sync_history(10).expect("history").is_empty());
    assert!(!dir.path().join("a").exists());
}

#[test]
fn one_failing_tool_does_not_stop_the_fleet() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tools = vec![
        json_tool("one", dir.path()),
        json_tool("two", dir.path()),
        json_tool("broken", dir.path()),
        toml_tool("four", dir.path()),
        json_tool("five", dir.path()),
    ];
    let state = create_test_state(tools);
    let fs_def = seed_definition(&state, "fs", "npx", &["-y", "@mcp/fs"]);
    let set = McpService::create_set(&state, "S", vec![McpSetItem::new(&fs_def.id)], None)
        .expect("create set");

    let broken_path = dir.path().join("broken").join("settings.json");
    fs::create_dir_all(broken_path.parent().expect("parent")).expect("mkdir");
    fs::write(&broken_path, "{ this is not json").expect("seed broken config");

    let results =
        SyncService::sync_fleet_mcp(&state, Some(set.id.as_str()), &[], SyncStrategy::Append);

    assert_eq!(
        statuses(&results),
        vec![
            ("one", SyncStatus::Success),
            ("two", SyncStatus::Success),
            ("broken", SyncStatus::Error),
            ("four", SyncStatus::Success),
            ("five", SyncStatus::Success),
        ]
    );
    let broken = &results[2];
    assert!(
        broken.message.as_deref().unwrap_or_default().contains("JSON"),
        "{broken:?}"
    );
    assert_eq!(
        results[0].applied_server_names.as_deref(),
        Some(&["fs".to_string()][..])
    );

    let written: Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join("five").join("settings.json")).expect("read"),
    )
    .expect("parse");
    assert_eq!(written["mcpServers"]["fs"]["command"], "npx");
    let toml = fs::read_to_string(dir.path().join("four").join("config.toml")).expect("read");
    assert!(toml.contains("[mcp_servers.fs]"), "{toml}");

    let history = state.db.list_sync_history(10).expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, SyncKind::Mcp);
    assert_eq!(history[0].source_id.as_deref(), Some(set.id.as_str()));
    assert_eq!(history[0].strategy, "append");
    assert_eq!((history[0].success_count, history[0].error_count), (4, 1));
}

#[test]
fn fleet_reports_skipped_and_unsupported_tools() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut not_installed = json_tool("absent", dir.path());
    not_installed.detect_dir = Some(dir.path().join("never-created"));
    let state = create_test_state(vec![
        json_tool("on", dir.path()),
        json_tool("off", dir.path()),
        not_installed,
        rules_only_tool("rules-only", dir.path()),
    ]);
    let fs_def = seed_definition(&state, "fs", "npx", &[]);
    let set = McpService::create_set(&state, "S", vec![McpSetItem::new(&fs_def.id)], None)
        .expect("create set");

    let mut off = SyncConfig::defaults_for("off");
    off.enabled = false;
    state.db.save_tool_sync_config(&off).expect("disable tool");

    let requested: Vec<String> = ["on", "off", "absent", "rules-only", "ghost"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let results =
        SyncService::sync_fleet_mcp(&state, Some(set.id.as_str()), &requested, SyncStrategy::Overwrite);

    assert_eq!(
        statuses(&results),
        vec![
            ("on", SyncStatus::Success),
            ("off", SyncStatus::Skipped),
            ("absent", SyncStatus::Skipped),
            ("rules-only", SyncStatus::Unsupported),
            ("ghost", SyncStatus::Error),
        ]
    );
    assert!(!dir.path().join("off").join("settings.json").exists());
}

#[test]
fn fleet_mcp_follows_tool_sync_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let project = tempfile::tempdir().expect("project");
    let state = create_test_state(vec![
        json_tool("explicit", dir.path()),
        json_tool("project", dir.path()),
    ]);
    let a = seed_definition(&state, "a", "cmd-a", &[]);
    let b = seed_definition(&state, "b", "cmd-b", &[]);
    let set = McpService::create_set(
        &state,
        "S",
        vec![McpSetItem::new(&a.id), McpSetItem::new(&b.id)],
        None,
    )
    .expect("create set");

    let override_path = dir.path().join("custom").join("mcp.json");
    let mut explicit = SyncConfig::defaults_for("explicit");
    explicit.target_path = Some(override_path.display().to_string());
    explicit.servers = Some(vec!["b".into()]);
    state.db.save_tool_sync_config(&explicit).expect("save");

    let mut scoped = SyncConfig::defaults_for("project");
    scoped.global = false;
    state.db.save_tool_sync_config(&scoped).expect("save");
    let mut settings = AppSettings::default();
    settings.default_project_root = Some(project.path().display().to_string());
    settings.save(&state.db).expect("save settings");

    let results = SyncService::sync_fleet_mcp(&state, Some(set.id.as_str()), &[], SyncStrategy::Append);

    assert_eq!(results[0].status, SyncStatus::Success, "{:?}", results[0]);
    assert_eq!(
        results[0].target_path.as_deref(),
        Some(override_path.display().to_string().as_str())
    );
    assert_eq!(
        results[0].applied_server_names.as_deref(),
        Some(&["b".to_string()][..])
    );

    let project_file = project.path().join(".project").join("mcp.json");
    assert_eq!(results[1].status, SyncStatus::Success, "{:?}", results[1]);
    assert!(project_file.exists());
}

#[test]
fn fleet_rules_syncs_every_tool_with_rules() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut no_rules = json_tool("mcp-only", dir.path());
    no_rules.rules_filename = None;
    no_rules.project_rules_filename = None;
    let state = create_test_state(vec![
        json_tool("claude", dir.path()),
        toml_tool("codex", dir.path()),
        rules_only_tool("windsurf", dir.path()),
        no_rules,
    ]);
    let rule = RuleService::create(&state, "r", "Prefer small diffs.").expect("rule");

    let results =
        SyncService::sync_fleet_rules(&state, None, SyncStrategy::Overwrite, Some(rule.id.as_str()));

    assert_eq!(
        statuses(&results),
        vec![
            ("claude", SyncStatus::Success),
            ("codex", SyncStatus::Success),
            ("windsurf", SyncStatus::Success),
            ("mcp-only", SyncStatus::Unsupported),
        ]
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("windsurf").join("global_rules.md")).expect("read"),
        "Prefer small diffs."
    );
    let history = state.db.list_sync_history(1).expect("history");
    assert_eq!(history[0].kind, SyncKind::Rules);
    assert_eq!(history[0].unsupported_count, 1);
}

#[test]
fn fleet_rules_into_project_marks_tools_without_project_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let project = tempfile::tempdir().expect("project");
    let mut global_only = rules_only_tool("global-only", dir.path());
    global_only.project_rules_filename = None;
    let state = create_test_state(vec![json_tool("claude", dir.path()), global_only]);
    let rule = RuleService::create(&state, "r", "x").expect("rule");

    let results = SyncService::sync_fleet_rules(
        &state,
        Some(project.path()),
        SyncStrategy::Append,
        Some(rule.id.as_str()),
    );

    assert_eq!(
        statuses(&results),
        vec![
            ("claude", SyncStatus::Success),
            ("global-only", SyncStatus::Unsupported),
        ]
    );
    assert!(project.path().join("CLAUDE.md").exists());
}

#[test]
fn fleet_rules_with_unknown_rule_reports_per_tool_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = create_test_state(vec![
        json_tool("claude", dir.path()),
        toml_tool("codex", dir.path()),
    ]);

    let results =
        SyncService::sync_fleet_rules(&state, None, SyncStrategy::Append, Some("missing"));

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.status == SyncStatus::Error));
}
