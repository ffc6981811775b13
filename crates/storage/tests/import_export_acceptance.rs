use std::path::Path;

use shared::domain::{Decision, RecordId};
use storage::{ImportOutcome, Storage};

const SOURCE: &str = "\
NCT Number,Study Title,Brief Summary,Conditions,Interventions,Locations,Countries,MCountries
NCT00000001,Vaccine trial,\"A trial, in two arms\",Malaria,\"Biological: RTS,S\",\"Kisumu, Kenya\",Kenya,Kenya
NCT00000002,Nutrition study,Supplement study,Stunting,Dietary Supplement,Lilongwe,Malawi,
NCT00000003,TB screening,Community screening,Tuberculosis,Device: X-ray,Durban,South Africa,South Africa
";

fn write_source(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("cleaned_studies.csv");
    std::fs::write(&path, SOURCE).expect("write source");
    path
}

fn database_url(dir: &Path) -> String {
    format!(
        "sqlite://{}",
        dir.join("screening_results.db")
            .to_string_lossy()
            .replace('\\', "/")
    )
}

#[tokio::test]
async fn import_is_idempotent_across_restarts() {
    let dir = tempfile::tempdir().expect("dir");
    let source = write_source(dir.path());
    let url = database_url(dir.path());

    let storage = Storage::new(&url).await.expect("db");
    let first = storage.initialize(&source).await.expect("import");
    assert_eq!(first, ImportOutcome::Imported { rows: 3 });
    storage
        .set_decision(RecordId(2), Decision::Exclude)
        .await
        .expect("decide");
    let before = storage.list_records().await.expect("records");
    drop(storage);

    let reopened = Storage::new(&url).await.expect("reopen");
    let second = reopened.initialize(&source).await.expect("second init");
    assert_eq!(second, ImportOutcome::AlreadyPopulated { rows: 3 });
    assert_eq!(reopened.list_records().await.expect("records"), before);
}

#[tokio::test]
async fn existing_table_does_not_need_the_source_file() {
    let dir = tempfile::tempdir().expect("dir");
    let source = write_source(dir.path());
    let url = database_url(dir.path());

    let storage = Storage::new(&url).await.expect("db");
    storage.initialize(&source).await.expect("import");
    std::fs::remove_file(&source).expect("remove source");

    let outcome = storage.initialize(&source).await.expect("no-op init");
    assert_eq!(outcome.rows(), 3);
}

#[tokio::test]
async fn missing_source_on_first_run_fails() {
    let dir = tempfile::tempdir().expect("dir");
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let err = storage
        .initialize(&dir.path().join("absent.csv"))
        .await
        .expect_err("should fail");
    assert!(format!("{err:#}").contains("does not exist"));
    assert_eq!(storage.row_count().await.expect("count"), 0);
}

#[tokio::test]
async fn export_matches_live_table() {
    let dir = tempfile::tempdir().expect("dir");
    let source = write_source(dir.path());
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.initialize(&source).await.expect("import");
    storage
        .set_decision(RecordId(0), Decision::Include)
        .await
        .expect("decide");
    storage
        .set_decision(RecordId(1), Decision::Exclude)
        .await
        .expect("decide");

    let export_path = dir.path().join("screening_results.csv");
    let report = storage.export_all(&export_path).await.expect("export");
    let counts = storage.counts().await.expect("counts");
    assert_eq!(report.rows, counts.total);

    let mut reader = csv::Reader::from_path(&export_path).expect("open export");
    let headers = reader.headers().expect("headers").clone();
    let decision_idx = headers
        .iter()
        .position(|h| h == "Decision")
        .expect("Decision column");
    let exported: Vec<String> = reader
        .records()
        .map(|r| r.expect("row")[decision_idx].to_string())
        .collect();
    assert_eq!(exported.len() as u64, counts.total);

    let live: Vec<String> = storage
        .list_records()
        .await
        .expect("records")
        .into_iter()
        .map(|r| r.decision.map(|d| d.to_string()).unwrap_or_default())
        .collect();
    assert_eq!(exported, live);
    assert_eq!(exported, vec!["Include", "Exclude", ""]);
}
