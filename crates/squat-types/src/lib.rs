//! Shared contracts for the squat detection relay.
//!
//! Both the proxy and the lifecycle controller speak these types, so they
//! live in their own crate to keep the wire shapes in one place.

mod api;
mod body;
mod error;

pub use api::{
    ApiError, DEFAULT_DEPTH_THRESHOLD, DetectionRequest, DetectionResult, MAX_DEPTH_THRESHOLD,
    MIN_DEPTH_THRESHOLD,
};
pub use body::JsonBody;
pub use error::ProxyError;
