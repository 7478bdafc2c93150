use std::fs;

use serial_test::serial;

use cli_sync_lib::{
    get_app_config_dir, get_database_path, AppSettings, AppState, Database, McpService,
    CONFIG_DIR_ENV,
};

#[path = "support.rs"]
mod support;
use support::{ensure_test_home, test_mutex};

#[test]
#[serial]
fn init_uses_config_dir_override() {
    let _guard = test_mutex().lock().expect("acquire test mutex");
    let home = ensure_test_home();
    let custom = home.join("portable-sync");
    std::env::set_var(CONFIG_DIR_ENV, &custom);

    assert_eq!(get_app_config_dir().expect("dir"), custom);
    let state = AppState::init().expect("init");
    assert!(get_database_path().expect("db path").exists());
    assert_eq!(
        state.registry.ids(),
        vec!["claude", "codex", "gemini", "cursor", "windsurf"]
    );

    std::env::remove_var(CONFIG_DIR_ENV);
    let _ = fs::remove_dir_all(&custom);
}

#[test]
#[serial]
fn data_survives_reopen() {
    let _guard = test_mutex().lock().expect("acquire test mutex");
    let home = ensure_test_home();
    let custom = home.join("reopen-sync");
    let _ = fs::remove_dir_all(&custom);
    std::env::set_var(CONFIG_DIR_ENV, &custom);

    let set_id = {
        let state = AppState::init().expect("init");
        let mut settings = AppSettings::default();
        settings.backup_retain = 4;
        settings
            .tool_dir_overrides
            .insert("codex".into(), home.join("alt-codex").display().to_string());
        settings.save(&state.db).expect("save settings");
        McpService::create_set(&state, "persisted", Vec::new(), None)
            .expect("create set")
            .id
    };

    let state = AppState::init().expect("reopen");
    assert_eq!(state.settings().backup_retain, 4);
    assert_eq!(
        state
            .registry
            .get("codex")
            .and_then(|t| t.global_mcp_path()),
        Some(home.join("alt-codex").join("config.toml"))
    );
    assert_eq!(
        state.db.get_active_mcp_set_id().expect("pointer"),
        Some(set_id)
    );

    let reopened = Database::open(&get_database_path().expect("db path")).expect("open again");
    assert_eq!(reopened.get_all_mcp_sets(true).expect("sets").len(), 1);

    std::env::remove_var(CONFIG_DIR_ENV);
    let _ = fs::remove_dir_all(&custom);
}
