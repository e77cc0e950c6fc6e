//! REST API handlers.
//!
//! Each handler calls one [`Orchestrator`](gantry_pipeline::Orchestrator)
//! operation and returns a JSON envelope; pipeline errors map onto HTTP
//! statuses in [`status_for`].

use std::convert::Infallible;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::{Stream, StreamExt};
use tracing::debug;

use gantry_core::types::AppConfig;
use gantry_ledger::LedgerError;
use gantry_pipeline::PipelineError;
use gantry_registry::RegistryError;
use gantry_stream::Subscriber;

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

/// HTTP status for a pipeline error.
///
/// Caller mistakes are 4xx: unknown names are 404, malformed configs and
/// checklist misuse are 400, and state conflicts (duplicate registration,
/// nothing to roll back to) are 409. A provider that failed underneath an
/// otherwise valid request is 502; everything else is a 500.
fn status_for(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::UnknownApp(_)
        | PipelineError::Ledger(LedgerError::MissingLedger(_))
        | PipelineError::Registry(RegistryError::NotFound(_)) => StatusCode::NOT_FOUND,
        PipelineError::Config(_)
        | PipelineError::ProviderUnavailable(_)
        | PipelineError::NoRecipe(_)
        | PipelineError::Ledger(
            LedgerError::OutOfOrder { .. } | LedgerError::AlreadyDone(_) | LedgerError::NotFound(_),
        ) => StatusCode::BAD_REQUEST,
        PipelineError::Registry(RegistryError::AlreadyExists(_))
        | PipelineError::Ledger(LedgerError::AlreadyExists(_))
        | PipelineError::NoSuccessfulDeploy(_) => StatusCode::CONFLICT,
        PipelineError::Provider(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn pipeline_error(err: &PipelineError) -> Response {
    error_response(&err.to_string(), status_for(err)).into_response()
}

// ── Applications ───────────────────────────────────────────────

/// GET /api/v1/apps
pub async fn list_apps(State(state): State<ApiState>) -> impl IntoResponse {
    match state.orchestrator.list_apps() {
        Ok(apps) => ApiResponse::ok(apps).into_response(),
        Err(e) => pipeline_error(&e),
    }
}

/// GET /api/v1/apps/{name}
pub async fn app_status(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.orchestrator.app_status(&name).await {
        Ok(status) => ApiResponse::ok(status).into_response(),
        Err(e) => pipeline_error(&e),
    }
}

/// DELETE /api/v1/apps/{name}
pub async fn remove_app(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.orchestrator.remove_app(&name) {
        Ok(true) => ApiResponse::ok("removed").into_response(),
        Ok(false) => error_response("application not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => pipeline_error(&e),
    }
}

// ── Deploys ────────────────────────────────────────────────────

/// POST /api/v1/apps/{name}/deploy
///
/// The body is the full application config; required on first contact,
/// optional afterwards. The deploy itself runs on the application's lane,
/// so the answer is a receipt, not a result.
pub async fn trigger_deploy(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    config: Option<Json<AppConfig>>,
) -> impl IntoResponse {
    match state
        .orchestrator
        .trigger_deploy(&name, config.map(|Json(c)| c))
        .await
    {
        Ok(receipt) => (StatusCode::ACCEPTED, ApiResponse::ok(receipt)).into_response(),
        Err(e) => pipeline_error(&e),
    }
}

/// POST /api/v1/apps/{name}/rollback
pub async fn rollback(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.orchestrator.rollback(&name).await {
        Ok(receipt) => (StatusCode::ACCEPTED, ApiResponse::ok(receipt)).into_response(),
        Err(e) => pipeline_error(&e),
    }
}

/// POST /api/v1/apps/{name}/release
///
/// Operator escape hatch for a wedged lane; 409 when the lane was idle.
pub async fn force_release(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.orchestrator.force_release(&name).await {
        Ok(true) => ApiResponse::ok("released").into_response(),
        Ok(false) => {
            error_response("no active deploy to release", StatusCode::CONFLICT).into_response()
        }
        Err(e) => pipeline_error(&e),
    }
}

// ── Tasks ──────────────────────────────────────────────────────

/// Body for checking off a task.
#[derive(serde::Deserialize)]
pub struct MarkDoneRequest {
    pub result: Option<String>,
}

/// GET /api/v1/apps/{name}/next-task
pub async fn next_task(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.orchestrator.next_task(&name) {
        Ok(next) => ApiResponse::ok(next).into_response(),
        Err(e) => pipeline_error(&e),
    }
}

/// POST /api/v1/apps/{name}/tasks/{index}/done
pub async fn mark_task_done(
    State(state): State<ApiState>,
    Path((name, index)): Path<(String, u32)>,
    body: Option<Json<MarkDoneRequest>>,
) -> impl IntoResponse {
    let result = body
        .and_then(|Json(b)| b.result)
        .unwrap_or_else(|| "done".to_string());
    match state.orchestrator.mark_task_done(&name, index, &result).await {
        Ok(next) => ApiResponse::ok(next).into_response(),
        Err(e) => pipeline_error(&e),
    }
}

// ── Events ─────────────────────────────────────────────────────

/// GET /api/v1/apps/{name}/events
///
/// Server-sent events, one frame per deploy event, named after the event
/// kind. Subscribing ahead of the first deploy is allowed; frames start
/// flowing once a pipeline publishes.
pub async fn stream_events(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let sub = state.orchestrator.subscribe(&name).await;
    Sse::new(event_stream(sub)).keep_alive(KeepAlive::default())
}

/// Adapts a broadcast subscription into SSE frames. A subscriber that
/// lagged behind skips the overwritten events instead of erroring the
/// whole stream.
fn event_stream(sub: Subscriber) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(sub.into_inner()).filter_map(|item| match item {
        Ok(event) => match Event::default().event(event.kind.label()).json_data(&event) {
            Ok(frame) => Some(Ok(frame)),
            Err(e) => {
                debug!(error = %e, "dropping unserializable event");
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            debug!(skipped, "event subscriber lagged, skipping ahead");
            None
        }
    })
}
