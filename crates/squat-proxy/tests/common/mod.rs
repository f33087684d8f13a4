#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use parking_lot::Mutex;
use squat_types::{DetectionRequest, DetectionResult};
use tokio::net::TcpListener;

/// How the fake pose backend answers `/api/squat`.
#[derive(Clone)]
pub enum Reply {
    /// Counts `reps` and echoes the requested threshold back.
    Reps(u32),
    Status(u16),
    Raw(&'static str),
}

#[derive(Clone)]
struct BackendState {
    reply: Reply,
    seen: Arc<Mutex<Vec<Seen>>>,
}

#[derive(Debug, Clone)]
pub struct Seen {
    pub method: &'static str,
    pub content_type: Option<String>,
    pub body: String,
}

pub struct Backend {
    pub base_url: String,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl Backend {
    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().clone()
    }
}

pub async fn spawn_backend(reply: Reply) -> Backend {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let state = BackendState {
        reply,
        seen: seen.clone(),
    };
    let app = Router::new()
        .route("/api/squat", get(backend_get).post(backend_post))
        .with_state(state);
    let base_url = serve(app).await;
    Backend { base_url, seen }
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

/// An address nothing is listening on.
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    addr
}

async fn backend_get(
    State(state): State<BackendState>,
    headers: axum::http::HeaderMap,
) -> Response {
    state.seen.lock().push(Seen {
        method: "GET",
        content_type: content_type(&headers),
        body: String::new(),
    });
    reply(&state.reply, None)
}

async fn backend_post(
    State(state): State<BackendState>,
    headers: axum::http::HeaderMap,
    body: Bytes,
) -> Response {
    let body = String::from_utf8_lossy(&body).into_owned();
    state.seen.lock().push(Seen {
        method: "POST",
        content_type: content_type(&headers),
        body: body.clone(),
    });
    let request = facet_json::from_str::<DetectionRequest>(&body).ok();
    reply(&state.reply, request)
}

fn content_type(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn reply(reply: &Reply, request: Option<DetectionRequest>) -> Response {
    match reply {
        Reply::Reps(reps) => {
            let depth_threshold = request.map(|r| r.depth_threshold).unwrap_or(90.0);
            let result = DetectionResult {
                success: true,
                squat_reps: *reps,
                processing_time: 4.5,
                depth_threshold,
                csv_file: "out.csv".into(),
            };
            let body = facet_json::to_string(&result).expect("encode stub result");
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                body,
            )
                .into_response()
        }
        Reply::Status(status) => {
            let status = StatusCode::from_u16(*status).expect("valid status");
            (status, r#"{"detail":"backend says no"}"#).into_response()
        }
        Reply::Raw(body) => (StatusCode::OK, *body).into_response(),
    }
}

/// Blocking HTTP call, returning status and body regardless of status class.
pub async fn http(method: &'static str, url: String, body: Option<String>) -> (u16, String) {
    tokio::task::spawn_blocking(move || {
        let request = ureq::request(method, &url).set("content-type", "application/json");
        let sent = match body {
            Some(body) => request.send_string(&body),
            None => request.call(),
        };
        let response = match sent {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(err)) => panic!("{method} {url}: {err}"),
        };
        let status = response.status();
        let body = response.into_string().expect("read body");
        (status, body)
    })
    .await
    .expect("http worker")
}
