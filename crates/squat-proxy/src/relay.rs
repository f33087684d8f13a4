use std::fmt;
use std::sync::Arc;

use squat_types::{DetectionRequest, JsonBody, ProxyError};
use tracing::{info, warn};

use crate::config::ProxyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Forwards detection requests and status queries to the backend.
///
/// Holds nothing but the injected config and a shared HTTP agent, so clones
/// are cheap and may be used from any number of threads at once. Calls block;
/// run them on a blocking thread when inside an async runtime.
#[derive(Clone)]
pub struct Relay {
    config: Arc<ProxyConfig>,
    agent: ureq::Agent,
}

impl Relay {
    pub fn new(config: ProxyConfig) -> Self {
        Self {
            config: Arc::new(config),
            agent: ureq::AgentBuilder::new().build(),
        }
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Sends one request to `{backend}/api/squat` and hands back its JSON body
    /// untouched. `payload` is required for POST and ignored for GET.
    pub fn forward(
        &self,
        method: Method,
        payload: Option<&JsonBody>,
    ) -> Result<JsonBody, ProxyError> {
        let target = self.config.squat_endpoint();
        let request = self
            .agent
            .request(method.as_str(), &target)
            .set("content-type", "application/json");

        let sent = match method {
            Method::Get => request.call(),
            Method::Post => {
                let Some(payload) = payload else {
                    return Err(ProxyError::InvalidRequest {
                        reason: "POST requires a JSON payload".into(),
                    });
                };
                request.send_string(payload.as_str())
            }
        };

        let response = match sent {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                warn!(%method, %target, status, "backend responded with error status");
                return Err(ProxyError::UpstreamError { status });
            }
            Err(ureq::Error::Transport(err)) => {
                warn!(%method, %target, kind = %err.kind(), "backend unreachable");
                return Err(ProxyError::UpstreamUnavailable {
                    reason: err.to_string(),
                });
            }
        };

        let status = response.status();
        if !(200..300).contains(&status) {
            warn!(%method, %target, status, "backend responded with non-success status");
            return Err(ProxyError::UpstreamError { status });
        }

        let text = response
            .into_string()
            .map_err(|e| ProxyError::body_read(&e, "backend"))?;
        match JsonBody::from_upstream(text) {
            Ok(body) => {
                info!(%method, %target, status, "forwarded to backend");
                Ok(body)
            }
            Err(err) => {
                warn!(%method, %target, status, "backend body is not json");
                Err(err)
            }
        }
    }

    /// Starts a detection run on the backend.
    pub fn detect(&self, request: &DetectionRequest) -> Result<JsonBody, ProxyError> {
        let payload = JsonBody::encode(request)?;
        self.forward(Method::Post, Some(&payload))
    }

    /// Polls the backend for its current status.
    pub fn status(&self) -> Result<JsonBody, ProxyError> {
        self.forward(Method::Get, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_without_payload_never_leaves_the_process() {
        // Nothing listens on port 9; a network attempt would surface as UpstreamUnavailable.
        let relay = Relay::new(ProxyConfig::new("http://127.0.0.1:9"));
        let err = relay
            .forward(Method::Post, None)
            .expect_err("POST without payload should fail");
        assert!(matches!(err, ProxyError::InvalidRequest { .. }));
    }

    #[test]
    fn method_renders_as_http_verb() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Post.as_str(), "POST");
    }
}
