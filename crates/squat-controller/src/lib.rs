//! Client-side lifecycle of a squat detection run.
//!
//! A [`DetectionController`] owns one [`LifecycleState`] and drives it from
//! `Idle` through `Processing` to `Succeeded` or `Failed`, using a
//! [`DetectionTransport`] to reach the relay.

mod cancel;
mod controller;
mod state;
mod transport;

pub use controller::DetectionController;
pub use state::{Detection, LifecycleState, Phase, RunId};
pub use transport::{DetectionTransport, HttpTransport, RelayTransport};
