use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use squat_proxy::Relay;
use squat_types::{ApiError, DetectionRequest, JsonBody, ProxyError};

/// How a controller reaches the relay for one detection run.
///
/// A successful call yields the backend's JSON body as received; the
/// controller derives the typed view from it.
#[async_trait]
pub trait DetectionTransport: Send + Sync {
    async fn detect(&self, request: DetectionRequest) -> Result<JsonBody, ProxyError>;
}

#[async_trait]
impl<T> DetectionTransport for Arc<T>
where
    T: DetectionTransport + ?Sized,
{
    async fn detect(&self, request: DetectionRequest) -> Result<JsonBody, ProxyError> {
        (**self).detect(request).await
    }
}

/// Talks to the relay's client-facing `POST /api/squat` over HTTP.
#[derive(Clone)]
pub struct HttpTransport {
    endpoint: Arc<String>,
    agent: ureq::Agent,
}

impl HttpTransport {
    /// `base_url` is the relay's address, e.g. `http://127.0.0.1:3000`.
    pub fn new(base_url: &str) -> Self {
        Self::with_agent(base_url, ureq::AgentBuilder::new().build())
    }

    /// Like [`new`](Self::new), but every call gives up after `timeout`.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        Self::with_agent(base_url, ureq::AgentBuilder::new().timeout(timeout).build())
    }

    fn with_agent(base_url: &str, agent: ureq::Agent) -> Self {
        Self {
            endpoint: Arc::new(format!("{}/api/squat", base_url.trim_end_matches('/'))),
            agent,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl DetectionTransport for HttpTransport {
    async fn detect(&self, request: DetectionRequest) -> Result<JsonBody, ProxyError> {
        let payload = JsonBody::encode(&request)?;
        let agent = self.agent.clone();
        let endpoint = self.endpoint.clone();
        tokio::task::spawn_blocking(move || post_detection(&agent, &endpoint, &payload))
            .await
            .map_err(|e| ProxyError::UpstreamUnavailable {
                reason: format!("detection worker join error: {e}"),
            })?
    }
}

fn post_detection(
    agent: &ureq::Agent,
    endpoint: &str,
    payload: &JsonBody,
) -> Result<JsonBody, ProxyError> {
    let response = match agent
        .post(endpoint)
        .set("content-type", "application/json")
        .send_string(payload.as_str())
    {
        Ok(response) => response,
        Err(ureq::Error::Status(status, response)) => {
            // The relay explains failures in an `{ "error": ... }` body; anything else is
            // reported without a message and falls back to the generic one.
            let message = response
                .into_string()
                .ok()
                .and_then(|text| facet_json::from_str::<ApiError>(&text).ok())
                .map(|api_error| api_error.error)
                .unwrap_or_default();
            return Err(ProxyError::Rejected { status, message });
        }
        Err(ureq::Error::Transport(err)) => {
            return Err(ProxyError::UpstreamUnavailable {
                reason: err.to_string(),
            });
        }
    };

    let text = response
        .into_string()
        .map_err(|e| ProxyError::body_read(&e, "relay"))?;
    JsonBody::from_upstream(text)
}

/// Calls the relay in-process, skipping the client-facing HTTP hop.
#[derive(Clone)]
pub struct RelayTransport {
    relay: Relay,
}

impl RelayTransport {
    pub fn new(relay: Relay) -> Self {
        Self { relay }
    }
}

#[async_trait]
impl DetectionTransport for RelayTransport {
    async fn detect(&self, request: DetectionRequest) -> Result<JsonBody, ProxyError> {
        let relay = self.relay.clone();
        tokio::task::spawn_blocking(move || relay.detect(&request))
            .await
            .map_err(|e| ProxyError::UpstreamUnavailable {
                reason: format!("relay worker join error: {e}"),
            })?
    }
}
