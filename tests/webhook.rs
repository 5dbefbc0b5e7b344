use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use vigil_bot::server::build_router;
use vigil_core::{PullRequestEvent, VigilError};
use vigil_review::pipeline::{EventHandler, SessionOutcome, SessionReport};

/// Stands in for the review pipeline behind the webhook routes.
struct StubHandler {
    fail: bool,
}

#[async_trait]
impl EventHandler for StubHandler {
    async fn handle_event(
        &self,
        event: &PullRequestEvent,
    ) -> Result<SessionOutcome, VigilError> {
        if self.fail {
            return Err(VigilError::Fetch("503 from GitHub".into()));
        }
        if !event.triggers_review() {
            return Ok(SessionOutcome::Skipped);
        }
        Ok(SessionOutcome::Completed(SessionReport::default()))
    }
}

fn event_body(action: &str) -> Body {
    Body::from(format!(
        r#"{{
            "action": "{action}",
            "pull_request": {{ "number": 3, "head": {{ "sha": "abc123" }} }},
            "repository": {{ "name": "demo", "owner": {{ "login": "acme" }} }}
        }}"#
    ))
}

fn webhook_request(action: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhooks/github")
        .header("content-type", "application/json")
        .body(event_body(action))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let router = build_router(Arc::new(StubHandler { fail: false }));
    let response = router
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("\"status\":\"ok\""));
}

#[tokio::test]
async fn opened_event_runs_a_session() {
    let router = build_router(Arc::new(StubHandler { fail: false }));
    let response = router.oneshot(webhook_request("opened")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("\"status\":\"reviewed\""));
    assert!(body.contains("\"report\""));
}

#[tokio::test]
async fn closed_event_is_acknowledged_without_review() {
    let router = build_router(Arc::new(StubHandler { fail: false }));
    let response = router.oneshot(webhook_request("closed")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("\"status\":\"ignored\""));
}

#[tokio::test]
async fn fatal_session_error_maps_to_bad_gateway() {
    let router = build_router(Arc::new(StubHandler { fail: true }));
    let response = router.oneshot(webhook_request("opened")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_text(response).await;
    assert!(body.contains("failed to fetch pull request files"));
}
