use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use shared::domain::Record;

use crate::import::SOURCE_COLUMNS;

pub fn export_header() -> Vec<&'static str> {
    let mut header = Vec::with_capacity(SOURCE_COLUMNS.len() + 3);
    header.push("id");
    header.extend(SOURCE_COLUMNS);
    header.push("Decision");
    header.push("Label");
    header
}

/// Renders every record as CSV; undecided rows get an empty `Decision` cell.
pub fn encode_records(records: &[Record]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(export_header())?;

    for record in records {
        let id = record.id.0.to_string();
        writer.write_record([
            id.as_str(),
            record.nct_number.as_str(),
            record.title.as_str(),
            record.summary.as_str(),
            record.conditions.as_str(),
            record.interventions.as_str(),
            record.locations.as_str(),
            record.countries.as_str(),
            record.secondary_countries.as_str(),
            record.decision.map(|d| d.as_str()).unwrap_or_default(),
            record.label.as_deref().unwrap_or_default(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("failed to flush csv export: {}", err.error()))
}

/// Writes next to `path` first, then renames over it.
pub async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.with_context(|| {
            format!("failed to create export directory '{}'", parent.display())
        })?;
    }

    let staging = staging_path(path);
    tokio::fs::write(&staging, bytes)
        .await
        .with_context(|| format!("failed to write '{}'", staging.display()))?;
    tokio::fs::rename(&staging, path)
        .await
        .with_context(|| format!("failed to move export into '{}'", path.display()))?;
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::{Decision, RecordId};

    fn record(id: i64, decision: Option<Decision>) -> Record {
        Record {
            id: RecordId(id),
            nct_number: format!("NCT{id:03}"),
            title: "Title, with comma".into(),
            summary: "Summary".into(),
            conditions: "HIV".into(),
            interventions: "Drug".into(),
            locations: "Kampala".into(),
            countries: "Uganda".into(),
            secondary_countries: "".into(),
            decision,
            label: None,
        }
    }

    #[test]
    fn header_wraps_source_columns_with_id_and_decision() {
        let header = export_header();
        assert_eq!(header.first(), Some(&"id"));
        assert_eq!(header[1], "NCT Number");
        assert_eq!(&header[header.len() - 2..], &["Decision", "Label"]);
    }

    #[test]
    fn encodes_decisions_and_quotes_commas() {
        let bytes = encode_records(&[record(0, Some(Decision::Include)), record(1, None)])
            .expect("encode");
        let text = String::from_utf8(bytes).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("0,NCT000,\"Title, with comma\""));
        assert!(lines[1].ends_with(",Include,"));
        assert!(lines[2].ends_with(",,"));
    }

    #[tokio::test]
    async fn atomic_write_replaces_existing_file() {
        let dir = tempfile::tempdir().expect("dir");
        let path = dir.path().join("out").join("results.csv");
        write_atomically(&path, b"first").await.expect("first write");
        write_atomically(&path, b"second").await.expect("second write");
        assert_eq!(std::fs::read(&path).expect("read"), b"second");
        assert!(!dir.path().join("out").join("results.csv.tmp").exists());
    }
}
