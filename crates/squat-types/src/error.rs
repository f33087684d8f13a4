use std::fmt;
use std::io;

/// Every way a detection request can fail between the caller and the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyError {
    /// The backend (or the relay, seen from a client) could not be reached.
    UpstreamUnavailable { reason: String },
    /// The backend answered with a non-2xx status.
    UpstreamError { status: u16 },
    /// The backend answered 2xx but the body was not the JSON we expected.
    MalformedUpstreamResponse { reason: String },
    /// The relay answered with its normalized `{ "error": ... }` body.
    Rejected { status: u16, message: String },
    /// The caller's own request could not be forwarded.
    InvalidRequest { reason: String },
    /// Depth threshold outside the range the backend understands.
    Validation { reason: String },
}

pub(crate) const GENERIC_FAILURE: &str = "Failed to process squat detection";

impl ProxyError {
    /// The single human-readable string shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::UpstreamUnavailable { .. } => "Could not reach the detection service".into(),
            Self::UpstreamError { .. } => GENERIC_FAILURE.into(),
            Self::MalformedUpstreamResponse { .. } => {
                "Detection service returned an unreadable response".into()
            }
            Self::Rejected { message, .. } if !message.trim().is_empty() => message.clone(),
            Self::Rejected { .. } => GENERIC_FAILURE.into(),
            Self::InvalidRequest { .. } | Self::Validation { .. } => self.to_string(),
        }
    }

    /// Classifies a failure to read a success response body. Bytes that are
    /// not text mean the peer answered with garbage; anything else is the
    /// connection going away mid-body.
    pub fn body_read(err: &io::Error, peer: &str) -> Self {
        if err.kind() == io::ErrorKind::InvalidData {
            Self::MalformedUpstreamResponse {
                reason: format!("{peer} response body is not utf-8: {err}"),
            }
        } else {
            Self::UpstreamUnavailable {
                reason: format!("read {peer} response body: {err}"),
            }
        }
    }

    /// Short, stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UpstreamUnavailable { .. } => "upstream_unavailable",
            Self::UpstreamError { .. } => "upstream_error",
            Self::MalformedUpstreamResponse { .. } => "malformed_upstream_response",
            Self::Rejected { .. } => "rejected",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::Validation { .. } => "validation",
        }
    }
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpstreamUnavailable { reason } => write!(f, "upstream unavailable: {reason}"),
            Self::UpstreamError { status } => write!(f, "upstream responded with status {status}"),
            Self::MalformedUpstreamResponse { reason } => {
                write!(f, "malformed upstream response: {reason}")
            }
            Self::Rejected { status, message } => {
                write!(f, "relay rejected request with status {status}: {message}")
            }
            Self::InvalidRequest { reason } => write!(f, "invalid request: {reason}"),
            Self::Validation { reason } => write!(f, "{reason}"),
        }
    }
}

impl std::error::Error for ProxyError {}
