use std::fmt;

use squat_types::{DetectionResult, JsonBody};

/// Identifies one `start()` call on a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(pub u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run:{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Processing,
    Succeeded,
    Failed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        })
    }
}

/// What the backend answered for a successful run.
///
/// The body is kept exactly as received, unknown fields included. The typed
/// report is a convenience view and is absent when the body does not have the
/// expected shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    body: JsonBody,
    report: Option<DetectionResult>,
}

impl Detection {
    pub fn from_body(body: JsonBody) -> Self {
        let report = body.decode::<DetectionResult>().ok();
        Self { body, report }
    }

    pub fn body(&self) -> &JsonBody {
        &self.body
    }

    pub fn as_str(&self) -> &str {
        self.body.as_str()
    }

    pub fn report(&self) -> Option<&DetectionResult> {
        self.report.as_ref()
    }
}

/// What a reader sees of a controller.
///
/// The result only exists in `Succeeded` and the message only in `Failed`,
/// so a reader can never observe both, or either one next to `Processing`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LifecycleState {
    #[default]
    Idle,
    Processing {
        run: RunId,
    },
    Succeeded(Detection),
    Failed {
        message: String,
    },
}

impl LifecycleState {
    pub fn phase(&self) -> Phase {
        match self {
            Self::Idle => Phase::Idle,
            Self::Processing { .. } => Phase::Processing,
            Self::Succeeded(_) => Phase::Succeeded,
            Self::Failed { .. } => Phase::Failed,
        }
    }

    pub fn result(&self) -> Option<&Detection> {
        match self {
            Self::Succeeded(detection) => Some(detection),
            _ => None,
        }
    }

    /// Typed view of the result, when the backend sent the expected shape.
    pub fn report(&self) -> Option<&DetectionResult> {
        self.result().and_then(Detection::report)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Failed { message } => Some(message),
            _ => None,
        }
    }

    pub fn run(&self) -> Option<RunId> {
        match self {
            Self::Processing { run } => Some(*run),
            _ => None,
        }
    }
}
