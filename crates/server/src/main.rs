use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use session::ScreeningSession;
use shared::{domain::RecordId, error::ApiError, protocol::Snapshot};
use storage::{ImportOutcome, Storage};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;
mod presenter;

use api::{http_decide, http_get_record, http_snapshot, status_for};
use app_state::AppState;
use config::{load_settings, prepare_database_url};
use presenter::{render_error_page, render_page, Notice};

const MAX_REQUEST_BYTES: usize = 64 * 1024;

type HtmlError = (StatusCode, Html<String>);

#[derive(Debug, Deserialize)]
struct DecideForm {
    id: i64,
    decision: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            error = %format!("{error:#}"),
            "failed to open screening database; remove or repair the file to continue"
        );
        error
    })?;

    match storage.initialize(&settings.source_csv).await {
        Ok(ImportOutcome::Imported { rows }) => {
            info!(rows, source = %settings.source_csv.display(), "studies table created");
        }
        Ok(ImportOutcome::AlreadyPopulated { rows }) => {
            info!(rows, "resuming existing screening session");
        }
        Err(error) => {
            error!(
                source = %settings.source_csv.display(),
                error = %format!("{error:#}"),
                "cannot start without studies to screen"
            );
            return Err(error);
        }
    }

    let state = AppState {
        session: ScreeningSession::new(storage, settings.export_path.clone()),
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, export_path = %settings.export_path.display(), "screening server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/decide", post(decide))
        .route("/next", post(next))
        .route("/export", post(export))
        .route("/export/download", get(download_export))
        .route("/api/snapshot", get(http_snapshot))
        .route("/api/records/:id", get(http_get_record))
        .route("/api/records/:id/decision", post(http_decide))
        .route("/healthz", get(healthz))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, StatusCode> {
    state
        .session
        .storage
        .health_check()
        .await
        .map_err(|error| {
            error!(error = %format!("{error:#}"), "health check failed");
            StatusCode::SERVICE_UNAVAILABLE
        })?;
    Ok("ok")
}

async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, HtmlError> {
    let snapshot = session::snapshot(&state.session)
        .await
        .map_err(html_error)?;
    Ok(page(&snapshot, None))
}

async fn decide(
    State(state): State<Arc<AppState>>,
    Form(form): Form<DecideForm>,
) -> Result<Html<String>, HtmlError> {
    let decision = session::parse_decision(&form.decision).map_err(html_error)?;
    match session::decide(&state.session, RecordId(form.id), decision).await {
        Ok(snapshot) => Ok(page(&snapshot, None)),
        Err(err) => rerender_with_failure(&state, err).await,
    }
}

async fn next(State(state): State<Arc<AppState>>) -> Result<Html<String>, HtmlError> {
    let snapshot = session::skip(&state.session).await.map_err(html_error)?;
    Ok(page(&snapshot, None))
}

async fn export(State(state): State<Arc<AppState>>) -> Result<Html<String>, HtmlError> {
    match session::export(&state.session).await {
        Ok((report, snapshot)) => Ok(page(&snapshot, Some(&Notice::Exported(report)))),
        Err(err) => rerender_with_failure(&state, err).await,
    }
}

async fn download_export(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HtmlError> {
    let path = &state.session.export_path;
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err((
                StatusCode::NOT_FOUND,
                Html(render_error_page("No export yet; use Export Data first.")),
            ));
        }
        Err(err) => {
            error!(path = %path.display(), error = %err, "failed to read export file");
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(render_error_page("Failed to read the export file.")),
            ));
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("screening_results.csv");
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\"")) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok((StatusCode::OK, headers, bytes))
}

fn page(snapshot: &Snapshot, notice: Option<&Notice>) -> Html<String> {
    Html(render_page(snapshot, notice))
}

/// Shows the failure above the current study with the mapped status code.
async fn rerender_with_failure(
    state: &AppState,
    err: ApiError,
) -> Result<Html<String>, HtmlError> {
    let status = status_for(err.code);
    if status.is_server_error() {
        error!(message = %err.message, "screening action failed");
        return Err(html_error(err));
    }
    let snapshot = session::snapshot(&state.session)
        .await
        .map_err(html_error)?;
    Err((
        status,
        page(&snapshot, Some(&Notice::Failed(err.message))),
    ))
}

fn html_error(err: ApiError) -> HtmlError {
    (
        status_for(err.code),
        Html(render_error_page(&err.message)),
    )
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
