use facet::Facet;

use crate::ProxyError;

pub const DEFAULT_DEPTH_THRESHOLD: f64 = 90.0;
pub const MIN_DEPTH_THRESHOLD: f64 = 0.0;
pub const MAX_DEPTH_THRESHOLD: f64 = 180.0;

/// Body of `POST /api/squat`, both towards the relay and the backend.
#[derive(Debug, Clone, PartialEq, Facet)]
pub struct DetectionRequest {
    /// Capture source. Only the webcam is supported by the backend today.
    pub use_webcam: bool,
    /// Knee flexion angle in degrees below which a squat counts as deep.
    pub depth_threshold: f64,
}

impl DetectionRequest {
    pub fn webcam(depth_threshold: f64) -> Self {
        Self {
            use_webcam: true,
            depth_threshold,
        }
    }

    /// Checks the threshold against the range the backend understands.
    ///
    /// This is advisory only. Requests are forwarded untouched whatever this
    /// returns; the backend has the final say on what it accepts.
    pub fn validate(&self) -> Result<(), ProxyError> {
        let value = self.depth_threshold;
        if !value.is_finite() {
            return Err(ProxyError::Validation {
                reason: format!("depth threshold must be a finite number, got {value}"),
            });
        }
        if !(MIN_DEPTH_THRESHOLD..=MAX_DEPTH_THRESHOLD).contains(&value) {
            return Err(ProxyError::Validation {
                reason: format!(
                    "depth threshold {value} is outside [{MIN_DEPTH_THRESHOLD}, {MAX_DEPTH_THRESHOLD}] degrees"
                ),
            });
        }
        Ok(())
    }
}

impl Default for DetectionRequest {
    fn default() -> Self {
        Self::webcam(DEFAULT_DEPTH_THRESHOLD)
    }
}

/// Outcome of a detection run as reported by the backend.
#[derive(Debug, Clone, PartialEq, Facet)]
pub struct DetectionResult {
    pub success: bool,
    pub squat_reps: u32,
    /// Wall-clock seconds the backend spent on pose estimation and analysis.
    pub processing_time: f64,
    /// Threshold the backend actually used; may differ from the request if it clamps.
    pub depth_threshold: f64,
    /// Opaque reference to the angles file the backend produced.
    pub csv_file: String,
}

#[derive(Debug, Clone, PartialEq, Facet)]
pub struct ApiError {
    pub error: String,
}
