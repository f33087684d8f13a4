//! Stateless HTTP relay between the squat detection front end and the
//! pose-estimation backend.

pub mod config;
pub mod relay;
pub mod routes;

pub use config::ProxyConfig;
pub use relay::{Method, Relay};
pub use routes::router;
