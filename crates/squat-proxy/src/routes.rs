use axum::Router;
use axum::body;
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use squat_types::{ApiError, JsonBody};
use tracing::{error, warn};

use crate::relay::{Method, Relay};

pub const DETECT_FAILURE_MESSAGE: &str = "Failed to process request";
pub const STATUS_FAILURE_MESSAGE: &str = "Failed to get data from backend";

const PROXY_BODY_LIMIT_BYTES: usize = 8 * 1024 * 1024;

/// Client-facing routes. Every failure, whatever its cause, comes back as
/// HTTP 500 with a fixed `{ "error": ... }` body; backend status codes and
/// messages never reach the client.
pub fn router(relay: Relay) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/squat", get(api_squat_status).post(api_squat_detect))
        .with_state(relay)
}

async fn health() -> impl IntoResponse {
    "ok"
}

async fn api_squat_detect(State(relay): State<Relay>, request: Request) -> Response {
    let bytes = match body::to_bytes(request.into_body(), PROXY_BODY_LIMIT_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(%e, "failed to read detection request body");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, DETECT_FAILURE_MESSAGE);
        }
    };
    let payload = match JsonBody::parse(&bytes) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(kind = err.kind(), len = bytes.len(), "rejected detection request body");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, DETECT_FAILURE_MESSAGE);
        }
    };
    relay_to_backend(relay, Method::Post, Some(payload), DETECT_FAILURE_MESSAGE).await
}

async fn api_squat_status(State(relay): State<Relay>) -> Response {
    relay_to_backend(relay, Method::Get, None, STATUS_FAILURE_MESSAGE).await
}

async fn relay_to_backend(
    relay: Relay,
    method: Method,
    payload: Option<JsonBody>,
    failure_message: &'static str,
) -> Response {
    let outcome =
        tokio::task::spawn_blocking(move || relay.forward(method, payload.as_ref())).await;
    match outcome {
        Ok(Ok(body)) => json_text(StatusCode::OK, body.into_string()),
        Ok(Err(err)) => {
            error!(%method, kind = err.kind(), %err, "error forwarding request to backend");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, failure_message)
        }
        Err(err) => {
            error!(%method, %err, "relay worker join error");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, failure_message)
        }
    }
}

fn json_text(status: StatusCode, body: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
        body,
    )
        .into_response()
}

fn json_error(status: StatusCode, message: &str) -> Response {
    let api_error = ApiError {
        error: message.to_string(),
    };
    match facet_json::to_string(&api_error) {
        Ok(body) => json_text(status, body),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!("json encode error: {e}"),
        )
            .into_response(),
    }
}
