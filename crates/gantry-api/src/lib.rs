//! gantry-api — REST surface of the deploy orchestrator.
//!
//! Thin axum layer over [`gantry_pipeline::Orchestrator`]: handlers parse
//! the request, call one orchestrator operation, and wrap the outcome in a
//! uniform JSON envelope. Long-running work never happens in a handler;
//! deploys and rollbacks are enqueued and answered with `202 Accepted`.
//!
//! # Routes
//!
//! | Method | Path                                | Purpose |
//! |--------|-------------------------------------|---------|
//! | GET    | `/api/v1/apps`                      | list registered applications |
//! | GET    | `/api/v1/apps/{name}`               | record, checklist, and queue state |
//! | DELETE | `/api/v1/apps/{name}`               | soft-remove an application |
//! | POST   | `/api/v1/apps/{name}/deploy`        | enqueue a deploy (config body optional) |
//! | GET    | `/api/v1/apps/{name}/next-task`     | lowest unchecked stage |
//! | POST   | `/api/v1/apps/{name}/tasks/{index}/done` | check off a stage |
//! | POST   | `/api/v1/apps/{name}/rollback`      | enqueue a re-release of the last success |
//! | POST   | `/api/v1/apps/{name}/release`       | force-release a wedged deploy lane |
//! | GET    | `/api/v1/apps/{name}/events`        | live deploy events (SSE) |

pub mod handlers;

use axum::Router;
use axum::routing::{get, post};
use gantry_pipeline::Orchestrator;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Orchestrator,
}

/// Build the complete API router with all routes configured.
pub fn build_router(orchestrator: Orchestrator) -> Router {
    let state = ApiState { orchestrator };

    let api_routes = Router::new()
        .route("/apps", get(handlers::list_apps))
        .route(
            "/apps/{name}",
            get(handlers::app_status).delete(handlers::remove_app),
        )
        .route("/apps/{name}/deploy", post(handlers::trigger_deploy))
        .route("/apps/{name}/next-task", get(handlers::next_task))
        .route(
            "/apps/{name}/tasks/{index}/done",
            post(handlers::mark_task_done),
        )
        .route("/apps/{name}/rollback", post(handlers::rollback))
        .route("/apps/{name}/release", post(handlers::force_release))
        .route("/apps/{name}/events", get(handlers::stream_events))
        .with_state(state);

    Router::new().nest("/api/v1", api_routes)
}
