use reposync::Settings;
use std::env;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_env_overrides_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("settings.toml");

    fs::write(
        &config_path,
        r#"
root = "/from/file"

[watcher]
batch_window_ms = 250

[repositories]
rescan_interval_secs = 30
"#,
    )
    .unwrap();

    unsafe {
        // Double underscore separates nested levels
        env::set_var("RS_WATCHER__BATCH_WINDOW_MS", "75");
        env::set_var("RS_REPOSITORIES__SERIALIZE_ACTIVITY", "false");
        env::set_var("RS_ROOT", "/from/env");
    }

    let settings = Settings::load_from(&config_path).unwrap();

    unsafe {
        env::remove_var("RS_WATCHER__BATCH_WINDOW_MS");
        env::remove_var("RS_REPOSITORIES__SERIALIZE_ACTIVITY");
        env::remove_var("RS_ROOT");
    }

    // Environment wins over the file
    assert_eq!(settings.watcher.batch_window_ms, 75);
    assert_eq!(settings.root, PathBuf::from("/from/env"));
    assert!(!settings.repositories.serialize_activity);
    // File value kept where no env var is set
    assert_eq!(settings.repositories.rescan_interval_secs, 30);
}
