//! GitHub webhook server.
//!
//! Endpoints:
//!   POST /webhooks/github   pull_request events
//!   GET  /health

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::{error, info};

use vigil_core::{PullRequestEvent, ServerConfig, VigilError};
use vigil_review::pipeline::{EventHandler, SessionOutcome};

/// Bind and serve the webhook router until the process is stopped.
///
/// # Errors
///
/// Returns [`VigilError::Config`] for an unparsable bind address and
/// [`VigilError::Io`] for listener or serve failures.
pub async fn serve(config: &ServerConfig, handler: Arc<dyn EventHandler>) -> Result<(), VigilError> {
    let addr: SocketAddr = format!("{}:{}", config.bind, config.port)
        .parse()
        .map_err(|e| VigilError::Config(format!("invalid bind address: {e}")))?;

    let router = build_router(handler);

    info!("webhook server listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

/// Build the webhook router around an event handler.
pub fn build_router(handler: Arc<dyn EventHandler>) -> Router {
    Router::new()
        .route("/webhooks/github", post(github_webhook))
        .route("/health", get(health))
        .with_state(handler)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn github_webhook(
    State(handler): State<Arc<dyn EventHandler>>,
    Json(event): Json<PullRequestEvent>,
) -> impl IntoResponse {
    // The session is awaited inline; with 30s pacing per file a response
    // can take minutes, which GitHub tolerates for webhook deliveries.
    match handler.handle_event(&event).await {
        Ok(SessionOutcome::Skipped) => (
            StatusCode::OK,
            Json(json!({ "status": "ignored", "action": event.action })),
        ),
        Ok(SessionOutcome::Completed(report)) => (
            StatusCode::OK,
            Json(json!({ "status": "reviewed", "report": report })),
        ),
        Err(e) => {
            error!(error = %e, "review session failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "status": "error", "message": e.to_string() })),
            )
        }
    }
}
