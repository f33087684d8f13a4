#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use parking_lot::Mutex;
use squat_types::{DetectionRequest, DetectionResult};
use tokio::net::TcpListener;

/// A fake pose backend that reports a fixed rep count and echoes the threshold.
pub struct Backend {
    pub base_url: String,
    received: Arc<Mutex<Vec<DetectionRequest>>>,
}

impl Backend {
    pub fn received(&self) -> Vec<DetectionRequest> {
        self.received.lock().clone()
    }
}

#[derive(Clone)]
struct BackendState {
    status: StatusCode,
    squat_reps: u32,
    received: Arc<Mutex<Vec<DetectionRequest>>>,
}

pub async fn spawn_backend(squat_reps: u32) -> Backend {
    spawn_backend_with_status(StatusCode::OK, squat_reps).await
}

pub async fn spawn_backend_with_status(status: StatusCode, squat_reps: u32) -> Backend {
    let received = Arc::new(Mutex::new(Vec::new()));
    let state = BackendState {
        status,
        squat_reps,
        received: received.clone(),
    };
    let app = Router::new()
        .route("/api/squat", post(detect))
        .with_state(state);
    Backend {
        base_url: serve(app).await,
        received,
    }
}

/// Serves `body` with `status` at `/api/squat`, whatever the request.
pub async fn spawn_raw(status: StatusCode, body: &'static [u8]) -> String {
    let app = Router::new().route(
        "/api/squat",
        post(move || async move {
            (status, [(header::CONTENT_TYPE, "application/json")], body)
        }),
    );
    serve(app).await
}

pub async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}")
}

pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    addr
}

async fn detect(State(state): State<BackendState>, body: Bytes) -> Response {
    let text = String::from_utf8_lossy(&body);
    let request: DetectionRequest =
        facet_json::from_str(&text).expect("relay should forward a detection request");
    state.received.lock().push(request.clone());
    if !state.status.is_success() {
        return (state.status, "pose pipeline exploded").into_response();
    }
    let result = DetectionResult {
        success: true,
        squat_reps: state.squat_reps,
        processing_time: 4.5,
        depth_threshold: request.depth_threshold,
        csv_file: "out.csv".into(),
    };
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        facet_json::to_string(&result).expect("encode stub result"),
    )
        .into_response()
}
