use super::*;

use std::collections::HashMap;

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/screening.db"),
        "sqlite://./data/screening.db"
    );
}

#[test]
fn empty_url_falls_back_to_default() {
    assert_eq!(
        normalize_database_url("   "),
        "sqlite://./screening_results.db"
    );
}

#[test]
fn keeps_memory_url_untouched() {
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
}

#[test]
fn keeps_windows_absolute_path_with_single_sqlite_colon() {
    assert_eq!(
        normalize_database_url("sqlite:C:\\Users\\alice\\screening.db"),
        "sqlite:C:/Users/alice/screening.db"
    );
}

#[test]
fn normalizes_windows_plain_path_with_single_sqlite_colon() {
    assert_eq!(
        normalize_database_url("C:\\Users\\alice\\screening.db"),
        "sqlite:C:/Users/alice/screening.db"
    );
}

#[test]
fn creates_parent_dir_for_sqlite_url() {
    let temp_root = tempfile::tempdir().expect("dir");
    let db_path = temp_root.path().join("data").join("screening.db");

    prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare db url");
    assert!(temp_root.path().join("data").exists());
}

#[test]
fn file_settings_override_defaults() {
    let mut settings = Settings::default();
    apply_file(
        &mut settings,
        r#"
bind_addr = "0.0.0.0:9000"
source_csv = "input/studies.csv"
export_path = "out/results.csv"
"#,
    )
    .expect("valid settings file");
    assert_eq!(settings.server_bind, "0.0.0.0:9000");
    assert_eq!(settings.source_csv, PathBuf::from("input/studies.csv"));
    assert_eq!(settings.export_path, PathBuf::from("out/results.csv"));
    assert_eq!(settings.database_url, Settings::default().database_url);
}

#[test]
fn malformed_settings_file_is_reported_and_ignored() {
    let mut settings = Settings::default();
    let result = apply_file(&mut settings, "bind_addr = [not a string");
    assert!(result.is_err());
    assert_eq!(settings.server_bind, Settings::default().server_bind);
    assert_eq!(settings.export_path, Settings::default().export_path);
}

#[test]
fn app_prefixed_env_wins_over_plain_names() {
    let env: HashMap<&str, &str> = HashMap::from([
        ("DATABASE_URL", "sqlite://plain.db"),
        ("APP__DATABASE_URL", "sqlite://app.db"),
        ("SCREENING_BIND", "127.0.0.1:7000"),
        ("APP__EXPORT_PATH", "exports/latest.csv"),
    ]);
    let mut settings = Settings::default();
    apply_env(&mut settings, |key| env.get(key).map(|v| v.to_string()));

    assert_eq!(settings.database_url, "sqlite://app.db");
    assert_eq!(settings.server_bind, "127.0.0.1:7000");
    assert_eq!(settings.export_path, PathBuf::from("exports/latest.csv"));
    assert_eq!(settings.source_csv, Settings::default().source_csv);
}

#[tokio::test]
async fn prepared_database_url_creates_openable_sqlite_file() {
    let temp_root = tempfile::tempdir().expect("dir");
    let db_path = temp_root.path().join("nested").join("screening.db");

    let prepared = prepare_database_url(db_path.to_string_lossy().as_ref()).expect("prepare");
    let storage = storage::Storage::new(&prepared).await.expect("open sqlite");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should be created: {}",
        db_path.display()
    );
}
