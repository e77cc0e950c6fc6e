//! API regression tests.
//!
//! Drives the full router the daemon serves, over an in-memory registry
//! and a temp-dir ledger store, with no providers configured.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tempfile::TempDir;
use tower::ServiceExt;

use gantry_core::config::DeployTuning;
use gantry_core::types::AppConfig;
use gantry_ledger::LedgerStore;
use gantry_pipeline::Orchestrator;
use gantry_provider::ProviderSet;
use gantry_registry::RegistryStore;

fn test_router() -> (Router, RegistryStore, TempDir) {
    let dir = TempDir::new().unwrap();
    let registry = RegistryStore::open_in_memory().unwrap();
    let ledgers = LedgerStore::open(dir.path()).unwrap();
    let orchestrator = Orchestrator::new(
        registry.clone(),
        ledgers,
        ProviderSet::empty(),
        DeployTuning::default(),
    )
    .unwrap();
    (gantry_api::build_router(orchestrator), registry, dir)
}

fn seed_app(registry: &RegistryStore, name: &str) {
    let mut config = AppConfig::new(name, "https://github.com/acme/demo");
    config.framework = Some("express".into());
    config.port = Some(3000);
    registry.register(name, config).unwrap();
}

#[tokio::test]
async fn api_list_apps_empty() {
    let (router, _registry, _dir) = test_router();

    let req = Request::builder()
        .uri("/api/v1/apps")
        .body(Body::empty())
        .unwrap();

    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn api_deploy_then_status() {
    let (router, _registry, _dir) = test_router();

    let body = r#"{"repo_url":"https://github.com/acme/shop","type":"express","port":3000}"#;
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/apps/web-shop/deploy")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();

    let resp = router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    // The record exists as soon as the deploy is admitted.
    let req = Request::builder()
        .uri("/api/v1/apps/web-shop")
        .body(Body::empty())
        .unwrap();

    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn api_first_deploy_requires_config() {
    let (router, _registry, _dir) = test_router();

    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/apps/ghost/deploy")
        .body(Body::empty())
        .unwrap();

    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn api_next_task_for_fresh_app() {
    let (router, registry, _dir) = test_router();
    seed_app(&registry, "fresh");

    let req = Request::builder()
        .uri("/api/v1/apps/fresh/next-task")
        .body(Body::empty())
        .unwrap();

    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn api_mark_task_done_enforces_order() {
    let (router, registry, _dir) = test_router();
    seed_app(&registry, "agentic");

    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/apps/agentic/tasks/1/done")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"result":"repo registered by agent"}"#))
        .unwrap();

    let resp = router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Skipping ahead is rejected.
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/apps/agentic/tasks/5/done")
        .body(Body::empty())
        .unwrap();

    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn api_remove_app() {
    let (router, registry, _dir) = test_router();
    seed_app(&registry, "old");

    let req = Request::builder()
        .method("DELETE")
        .uri("/api/v1/apps/old")
        .body(Body::empty())
        .unwrap();

    let resp = router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Confirm gone.
    let req = Request::builder()
        .method("DELETE")
        .uri("/api/v1/apps/old")
        .body(Body::empty())
        .unwrap();

    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn api_rollback_needs_a_success() {
    let (router, registry, _dir) = test_router();
    seed_app(&registry, "fresh");

    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/apps/fresh/rollback")
        .body(Body::empty())
        .unwrap();

    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn api_release_on_idle_lane_conflicts() {
    let (router, registry, _dir) = test_router();
    seed_app(&registry, "calm");

    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/apps/calm/release")
        .body(Body::empty())
        .unwrap();

    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn api_events_endpoint_is_sse() {
    let (router, _registry, _dir) = test_router();

    let req = Request::builder()
        .uri("/api/v1/apps/web-shop/events")
        .body(Body::empty())
        .unwrap();

    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(
        content_type.starts_with("text/event-stream"),
        "unexpected content type: {content_type}"
    );
}
