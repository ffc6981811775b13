use std::path::PathBuf;

use shared::{
    domain::{Decision, Record, RecordId},
    error::{ApiError, ErrorCode},
    protocol::{ExportReport, Snapshot},
};
use storage::{DecisionOutcome, Storage};
use tracing::info;

/// Everything one screening render cycle needs.
#[derive(Clone)]
pub struct ScreeningSession {
    pub storage: Storage,
    pub export_path: PathBuf,
}

impl ScreeningSession {
    pub fn new(storage: Storage, export_path: impl Into<PathBuf>) -> Self {
        Self {
            storage,
            export_path: export_path.into(),
        }
    }
}

/// Active while an undecided record exists, Complete otherwise.
pub async fn snapshot(ctx: &ScreeningSession) -> Result<Snapshot, ApiError> {
    let next = ctx.storage.next_undecided().await.map_err(internal)?;
    let counts = ctx.storage.counts().await.map_err(internal)?;
    Ok(match next {
        Some(record) => Snapshot::Active { record, counts },
        None => Snapshot::Complete { counts },
    })
}

pub async fn decide(
    ctx: &ScreeningSession,
    id: RecordId,
    decision: Decision,
) -> Result<Snapshot, ApiError> {
    let outcome = ctx
        .storage
        .set_decision(id, decision)
        .await
        .map_err(internal)?;
    match outcome {
        DecisionOutcome::Applied => {
            info!(record_id = id.0, %decision, "decision recorded");
        }
        DecisionOutcome::Unchanged => {
            info!(record_id = id.0, %decision, "decision already recorded");
        }
        DecisionOutcome::Conflict { existing } => {
            return Err(ApiError::new(
                ErrorCode::Conflict,
                format!("study {} is already marked {existing}", id.display_number()),
            ));
        }
        DecisionOutcome::NotFound => {
            return Err(ApiError::new(
                ErrorCode::NotFound,
                format!("study {} not found", id.display_number()),
            ));
        }
    }
    snapshot(ctx).await
}

/// Re-renders without writing; the same undecided record comes back.
pub async fn skip(ctx: &ScreeningSession) -> Result<Snapshot, ApiError> {
    let snapshot = snapshot(ctx).await?;
    if let Some(record) = snapshot.record() {
        info!(record_id = record.id.0, "skip requested; record stays first in line");
    }
    Ok(snapshot)
}

pub async fn export(ctx: &ScreeningSession) -> Result<(ExportReport, Snapshot), ApiError> {
    let report = ctx
        .storage
        .export_all(&ctx.export_path)
        .await
        .map_err(internal)?;
    info!(path = %report.path, rows = report.rows, "exported screening results");
    Ok((report, snapshot(ctx).await?))
}

pub async fn get_record(ctx: &ScreeningSession, id: RecordId) -> Result<Record, ApiError> {
    ctx.storage
        .get_record(id)
        .await
        .map_err(internal)?
        .ok_or_else(|| {
            ApiError::new(
                ErrorCode::NotFound,
                format!("study {} not found", id.display_number()),
            )
        })
}

pub fn parse_decision(raw: &str) -> Result<Decision, ApiError> {
    raw.parse::<Decision>()
        .map_err(|e| ApiError::new(ErrorCode::Validation, e.to_string()))
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, format!("{err:#}"))
}
