use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};
use tracing::{info, warn};

use shared::{
    domain::{Decision, Record, RecordId},
    protocol::{Counts, ExportReport},
};

pub mod export;
pub mod import;

pub use import::{read_source, ImportOutcome, SourceRow, SourceTable, SOURCE_COLUMNS};

const RECORD_COLUMNS: &str = "id, nct_number, title, summary, conditions, interventions, \
     locations, countries, secondary_countries, decision, label";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

/// Result of a conditional decision write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionOutcome {
    Applied,
    /// The record already carried the same decision.
    Unchanged,
    Conflict { existing: Decision },
    NotFound,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid database url '{database_url}'"))?
            .create_if_missing(true);
        // One connection serializes every read and write.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open sqlite database '{database_url}'"))?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to apply studies schema")?;
        Ok(Self { pool })
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Loads `source` into the table unless it already holds rows.
    pub async fn initialize(&self, source: &Path) -> Result<ImportOutcome> {
        let existing = self.row_count().await?;
        if existing > 0 {
            info!(rows = existing, "studies table already populated; skipping import");
            return Ok(ImportOutcome::AlreadyPopulated { rows: existing });
        }

        let table = read_source(source)
            .with_context(|| format!("cannot populate empty studies table from '{}'", source.display()))?;
        if !table.ignored_columns.is_empty() {
            warn!(
                columns = ?table.ignored_columns,
                "source columns not screened; they will not be imported"
            );
        }

        let rows = self.insert_rows(&table.rows).await?;
        info!(rows, source = %source.display(), "imported studies");
        Ok(ImportOutcome::Imported { rows })
    }

    /// Inserts rows with ids `0..n` in a single transaction.
    pub async fn insert_rows(&self, rows: &[SourceRow]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        for (idx, row) in rows.iter().enumerate() {
            let id = i64::try_from(idx).context("too many rows to import")?;
            sqlx::query(
                r#"
                INSERT INTO studies (
                    id,
                    nct_number,
                    title,
                    summary,
                    conditions,
                    interventions,
                    locations,
                    countries,
                    secondary_countries,
                    decision,
                    label
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL, NULL)
                "#,
            )
            .bind(id)
            .bind(&row.nct_number)
            .bind(&row.title)
            .bind(&row.summary)
            .bind(&row.conditions)
            .bind(&row.interventions)
            .bind(&row.locations)
            .bind(&row.countries)
            .bind(&row.secondary_countries)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to insert study row {id}"))?;
        }
        tx.commit().await.context("failed to commit study import")?;
        Ok(rows.len() as u64)
    }

    pub async fn row_count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM studies")
            .fetch_one(&self.pool)
            .await?;
        Ok(non_negative(count))
    }

    pub async fn next_undecided(&self) -> Result<Option<Record>> {
        let row = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM studies WHERE decision IS NULL ORDER BY id ASC LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(record_from_row).transpose()
    }

    pub async fn get_record(&self, id: RecordId) -> Result<Option<Record>> {
        let row = sqlx::query(&format!("SELECT {RECORD_COLUMNS} FROM studies WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(record_from_row).transpose()
    }

    pub async fn list_records(&self) -> Result<Vec<Record>> {
        let rows = sqlx::query(&format!("SELECT {RECORD_COLUMNS} FROM studies ORDER BY id ASC"))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(record_from_row).collect()
    }

    pub async fn counts(&self) -> Result<Counts> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(decision) AS decided,
                COALESCE(SUM(CASE WHEN decision = 'Include' THEN 1 ELSE 0 END), 0) AS included,
                COALESCE(SUM(CASE WHEN decision = 'Exclude' THEN 1 ELSE 0 END), 0) AS excluded
            FROM studies
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(Counts {
            total: non_negative(row.try_get("total")?),
            decided: non_negative(row.try_get("decided")?),
            included: non_negative(row.try_get("included")?),
            excluded: non_negative(row.try_get("excluded")?),
        })
    }

    /// Writes `decision` only if the record is still undecided.
    pub async fn set_decision(&self, id: RecordId, decision: Decision) -> Result<DecisionOutcome> {
        let result =
            sqlx::query("UPDATE studies SET decision = ?1 WHERE id = ?2 AND decision IS NULL")
                .bind(decision.as_str())
                .bind(id.0)
                .execute(&self.pool)
                .await
                .with_context(|| format!("failed to record decision for study {id}"))?;
        if result.rows_affected() == 1 {
            return Ok(DecisionOutcome::Applied);
        }

        let existing: Option<Option<String>> =
            sqlx::query_scalar("SELECT decision FROM studies WHERE id = ?")
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await?;
        match existing {
            None => Ok(DecisionOutcome::NotFound),
            Some(None) => Err(anyhow!("study {id} stayed undecided after update")),
            Some(Some(raw)) => {
                let existing = Decision::from_str(&raw)
                    .with_context(|| format!("study {id} holds an invalid decision"))?;
                if existing == decision {
                    Ok(DecisionOutcome::Unchanged)
                } else {
                    Ok(DecisionOutcome::Conflict { existing })
                }
            }
        }
    }

    /// Dumps the whole table to `path` as CSV, replacing any previous export.
    pub async fn export_all(&self, path: &Path) -> Result<ExportReport> {
        let records = self.list_records().await?;
        let bytes = export::encode_records(&records)?;
        export::write_atomically(path, &bytes).await?;
        Ok(ExportReport {
            path: path.display().to_string(),
            rows: records.len() as u64,
            exported_at: Utc::now(),
        })
    }
}

fn record_from_row(row: &SqliteRow) -> Result<Record> {
    let id = RecordId(row.try_get("id")?);
    let decision: Option<String> = row.try_get("decision")?;
    let decision = decision
        .as_deref()
        .map(Decision::from_str)
        .transpose()
        .with_context(|| format!("study {id} holds an invalid decision"))?;

    Ok(Record {
        id,
        nct_number: row.try_get("nct_number")?,
        title: row.try_get("title")?,
        summary: row.try_get("summary")?,
        conditions: row.try_get("conditions")?,
        interventions: row.try_get("interventions")?,
        locations: row.try_get("locations")?,
        countries: row.try_get("countries")?,
        secondary_countries: row.try_get("secondary_countries")?,
        decision,
        label: row.try_get("label")?,
    })
}

fn non_negative(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
