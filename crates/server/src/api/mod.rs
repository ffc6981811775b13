use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use shared::{
    domain::{Record, RecordId},
    error::{ApiError, ErrorCode},
    protocol::{DecisionRequest, Snapshot},
};
use tracing::error;

use crate::app_state::AppState;

pub(crate) type JsonError = (StatusCode, Json<ApiError>);

pub(crate) fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn json_error(err: ApiError) -> JsonError {
    if matches!(err.code, ErrorCode::Internal) {
        error!(message = %err.message, "request failed");
    }
    (status_for(err.code), Json(err))
}

fn rejected(detail: String) -> JsonError {
    json_error(ApiError::new(ErrorCode::Validation, detail))
}

fn record_id(path: Result<Path<i64>, PathRejection>) -> Result<RecordId, JsonError> {
    let Path(id) = path.map_err(|rejection| rejected(rejection.body_text()))?;
    Ok(RecordId(id))
}

pub(crate) async fn http_snapshot(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Snapshot>, JsonError> {
    let snapshot = session::snapshot(&state.session)
        .await
        .map_err(json_error)?;
    Ok(Json(snapshot))
}

pub(crate) async fn http_get_record(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Record>, JsonError> {
    let id = record_id(path)?;
    let record = session::get_record(&state.session, id)
        .await
        .map_err(json_error)?;
    Ok(Json(record))
}

pub(crate) async fn http_decide(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<DecisionRequest>, JsonRejection>,
) -> Result<Json<Snapshot>, JsonError> {
    let id = record_id(path)?;
    let Json(req) = body.map_err(|rejection| rejected(rejection.body_text()))?;
    let decision = session::parse_decision(&req.decision).map_err(json_error)?;
    let snapshot = session::decide(&state.session, id, decision)
        .await
        .map_err(json_error)?;
    Ok(Json(snapshot))
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
