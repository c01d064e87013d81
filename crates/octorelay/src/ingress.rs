// SPDX-FileCopyrightText: 2026 Octorelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook HTTP listener built on axum.
//!
//! Routes:
//! - `POST /webhooks/github`: publishes supported deliveries to their queue
//! - `GET /health`: liveness probe

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use octorelay_config::model::IngressConfig;
use octorelay_core::queues;
use octorelay_core::RelayError;
use octorelay_queue::events::GithubWebhook;
use octorelay_queue::QueueClient;

const EVENT_HEADER: &str = "x-github-event";
const SIGNATURE_HEADER: &str = "x-hub-signature";

/// Shared state for the request handlers.
#[derive(Clone)]
pub struct IngressState {
    pub queue: QueueClient,
}

pub fn router(state: IngressState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/webhooks/github", post(post_github_webhook))
        .route("/health", get(get_health))
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
}

/// Binds the listener and serves until `cancel` fires.
///
/// Binding happens before this returns so that an occupied port fails
/// startup instead of a background task.
pub async fn spawn(
    config: &IngressConfig,
    queue: QueueClient,
    cancel: CancellationToken,
) -> Result<JoinHandle<()>, RelayError> {
    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| RelayError::Config(format!("failed to bind webhook listener to {addr}: {e}")))?;
    let app = router(IngressState { queue }, config.max_body_bytes);

    info!(%addr, "webhook listener started");
    Ok(tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await;
        match result {
            Ok(()) => info!("webhook listener stopped"),
            Err(e) => error!(error = %e, "webhook listener failed"),
        }
    }))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// POST /webhooks/github
async fn post_github_webhook(
    State(state): State<IngressState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let Some(event) = header(&headers, EVENT_HEADER) else {
        debug!("webhook without an event header");
        return StatusCode::BAD_REQUEST;
    };
    let Some(queue) = queues::for_github_event(event) else {
        debug!(event, "webhook event not consumed");
        return StatusCode::NO_CONTENT;
    };
    let Some(signature) = header(&headers, SIGNATURE_HEADER) else {
        warn!(event, "unsigned webhook rejected");
        return StatusCode::UNAUTHORIZED;
    };
    let Ok(body) = String::from_utf8(body.to_vec()) else {
        warn!(event, "webhook body is not UTF-8");
        return StatusCode::BAD_REQUEST;
    };

    let delivery = GithubWebhook {
        event: event.to_string(),
        signature: signature.to_string(),
        body,
    };
    match state.queue.publish(queue, &delivery).await {
        Ok(()) => {
            debug!(event, queue, "webhook accepted");
            StatusCode::ACCEPTED
        }
        Err(e) => {
            error!(event, queue, error = %e, "failed to enqueue webhook");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// GET /health
async fn get_health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use octorelay_queue::{Envelope, MemoryBroker};
    use tower::ServiceExt;

    use super::*;

    fn app() -> (Arc<MemoryBroker>, Router) {
        let broker = Arc::new(MemoryBroker::new(5));
        let queue = QueueClient::new(broker.clone(), Duration::from_millis(10));
        (broker, router(IngressState { queue }, 1024))
    }

    fn webhook(event: Option<&str>, signature: Option<&str>, body: impl Into<Body>) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri("/webhooks/github");
        if let Some(event) = event {
            builder = builder.header("X-GitHub-Event", event);
        }
        if let Some(signature) = signature {
            builder = builder.header("X-Hub-Signature", signature);
        }
        builder.body(body.into()).unwrap()
    }

    #[tokio::test]
    async fn supported_event_is_published_to_its_queue() {
        let (broker, app) = app();
        let body = r#"{"repository":{"full_name":"octo/repo"}}"#;
        let response = app
            .oneshot(webhook(Some("push"), Some("sha1=abc"), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let published = broker.pending_bodies(queues::GITHUB_PUSH);
        assert_eq!(published.len(), 1);
        let delivery: GithubWebhook = Envelope::decode(&published[0])
            .unwrap()
            .into_event()
            .unwrap();
        assert_eq!(delivery.event, "push");
        assert_eq!(delivery.signature, "sha1=abc");
        assert_eq!(delivery.body, body);
    }

    #[tokio::test]
    async fn ping_and_unknown_events_are_acknowledged_without_publishing() {
        for event in ["ping", "release"] {
            let (broker, app) = app();
            let response = app
                .oneshot(webhook(Some(event), Some("sha1=abc"), "{}"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NO_CONTENT, "{event}");
            assert_eq!(broker.stats().published, 0);
        }
    }

    #[tokio::test]
    async fn missing_signature_is_unauthorized() {
        let (broker, app) = app();
        let response = app
            .oneshot(webhook(Some("issues"), None, "{}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(broker.pending(queues::GITHUB_ISSUES), 0);
    }

    #[tokio::test]
    async fn missing_event_header_is_a_bad_request() {
        let (_broker, app) = app();
        let response = app.oneshot(webhook(None, Some("sha1=abc"), "{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_utf8_body_is_a_bad_request() {
        let (_broker, app) = app();
        let response = app
            .oneshot(webhook(Some("issues"), Some("sha1=abc"), vec![0xff, 0xfe, 0x00]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let (broker, app) = app();
        let mut request = webhook(Some("push"), Some("sha1=abc"), "x".repeat(4096));
        request
            .headers_mut()
            .insert("content-length", "4096".parse().unwrap());
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(broker.pending(queues::GITHUB_PUSH), 0);
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (_broker, app) = app();
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
    }
}
