use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use squat_types::{DetectionRequest, JsonBody, ProxyError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::state::{Detection, LifecycleState, Phase, RunId};
use crate::transport::DetectionTransport;

/// Drives one detection widget's lifecycle.
///
/// Calling [`start`](Self::start) while a run is in flight supersedes it: the
/// earlier run is cancelled and its late outcome is discarded. Dropping the
/// controller cancels whatever is in flight.
pub struct DetectionController<T> {
    transport: Arc<T>,
    shared: Arc<Shared>,
    next_run: AtomicU64,
}

struct Shared {
    state: watch::Sender<LifecycleState>,
    active: Mutex<Option<ActiveRun>>,
}

struct ActiveRun {
    id: RunId,
    token: CancelToken,
}

impl<T> DetectionController<T>
where
    T: DetectionTransport + 'static,
{
    pub fn new(transport: T) -> Self {
        let (state, _) = watch::channel(LifecycleState::Idle);
        Self {
            transport: Arc::new(transport),
            shared: Arc::new(Shared {
                state,
                active: Mutex::new(None),
            }),
            next_run: AtomicU64::new(1),
        }
    }

    /// Begins a run and returns immediately; follow progress through
    /// [`state`](Self::state) or [`subscribe`](Self::subscribe).
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, request: DetectionRequest) -> RunId {
        let id = RunId(self.next_run.fetch_add(1, Ordering::Relaxed));
        let token = CancelToken::new();
        {
            let mut active = self.shared.active.lock();
            let previous = active.replace(ActiveRun {
                id,
                token: token.clone(),
            });
            if let Some(previous) = previous {
                previous.token.cancel();
                info!(superseded = %previous.id, %id, "superseding in-flight detection run");
            }
            self.shared
                .state
                .send_replace(LifecycleState::Processing { run: id });
        }
        debug!(
            %id,
            use_webcam = request.use_webcam,
            depth_threshold = request.depth_threshold,
            "detection run started"
        );

        let transport = self.transport.clone();
        let shared = self.shared.clone();
        tokio::spawn(async move {
            let outcome = tokio::select! {
                outcome = transport.detect(request) => outcome,
                () = token.cancelled() => {
                    debug!(%id, "detection run cancelled before it resolved");
                    return;
                }
            };
            shared.resolve(id, outcome);
        });
        id
    }

    /// Aborts the in-flight run, if any, and returns to `Idle`.
    pub fn cancel(&self) -> bool {
        let mut active = self.shared.active.lock();
        let Some(run) = active.take() else {
            return false;
        };
        run.token.cancel();
        self.shared.state.send_replace(LifecycleState::Idle);
        info!(id = %run.id, "detection run cancelled");
        true
    }

    pub fn state(&self) -> LifecycleState {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.shared.state.subscribe()
    }

    /// Waits until no run is in flight and returns that state.
    pub async fn settled(&self) -> LifecycleState {
        let mut rx = self.subscribe();
        match rx.wait_for(|state| state.phase() != Phase::Processing).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }
}

impl Shared {
    fn resolve(&self, id: RunId, outcome: Result<JsonBody, ProxyError>) {
        let mut active = self.active.lock();
        let current = active
            .as_ref()
            .is_some_and(|run| run.id == id && !run.token.is_cancelled());
        if !current {
            debug!(%id, "discarding outcome of stale detection run");
            return;
        }
        *active = None;

        let next = match outcome {
            Ok(body) => {
                let detection = Detection::from_body(body);
                match detection.report() {
                    Some(report) => info!(
                        %id,
                        squat_reps = report.squat_reps,
                        processing_time = report.processing_time,
                        "detection run succeeded"
                    ),
                    None => warn!(
                        %id,
                        bytes = detection.body().len(),
                        "detection run succeeded with an unexpected result shape"
                    ),
                }
                LifecycleState::Succeeded(detection)
            }
            Err(err) => {
                warn!(%id, kind = err.kind(), %err, "detection run failed");
                LifecycleState::Failed {
                    message: err.user_message(),
                }
            }
        };
        self.state.send_replace(next);
    }
}

impl<T> Drop for DetectionController<T> {
    fn drop(&mut self) {
        if let Some(run) = self.shared.active.lock().take() {
            run.token.cancel();
        }
    }
}
