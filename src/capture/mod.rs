//! Food capture: one frame in, one classification out
//!
//! The [`CaptureController`] drives a small tagged state machine:
//!
//! ```text
//! Idle --capture()--> Capturing --frame--> Submitted --ok--> Result --reset()--> Idle
//!                         |                    |
//!                      no frame              error
//!                         v                    v
//!                        Idle                 Idle
//! ```
//!
//! Only `Idle` accepts a capture. A capture arriving in any other state is
//! ignored, which keeps at most one classification request in flight.

pub mod frame;

pub use frame::{CapturedFrame, FrameSource, ImageFileFeed, StaticFeed};

use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::ErrorPolicy;
use crate::error::user_message;
use crate::service::types::CaptureResult;
use crate::service::MealService;

/// Where the capture interaction currently stands.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CaptureState {
    /// Feed live, nothing pending
    #[default]
    Idle,
    /// Taking the still frame
    Capturing,
    /// Frame sent, waiting for the classifier
    Submitted { frame: CapturedFrame },
    /// Classification received
    Result {
        frame: CapturedFrame,
        result: CaptureResult,
    },
}

impl CaptureState {
    fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Capturing => "capturing",
            Self::Submitted { .. } => "submitted",
            Self::Result { .. } => "result",
        }
    }
}

/// What a call to [`CaptureController::capture`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// The feed had no frame; nothing was sent
    NoFrame,
    /// A capture is pending or a result is on screen; nothing was sent
    Ignored,
    /// The classifier answered
    Classified(CaptureResult),
    /// The frame could not be encoded or the request failed
    Failed(String),
}

/// Controller for the scan interaction.
pub struct CaptureController {
    service: Arc<dyn MealService>,
    policy: ErrorPolicy,
    state: Mutex<CaptureState>,
    last_error: Mutex<Option<String>>,
}

impl CaptureController {
    /// Controller submitting frames to `service`, handling failures per
    /// `policy`.
    pub fn new(service: Arc<dyn MealService>, policy: ErrorPolicy) -> Self {
        Self {
            service,
            policy,
            state: Mutex::new(CaptureState::Idle),
            last_error: Mutex::new(None),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, CaptureState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_error(&self) -> MutexGuard<'_, Option<String>> {
        self.last_error.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, next: CaptureState) {
        let mut state = self.lock_state();
        tracing::debug!("Capture state {} -> {}", state.name(), next.name());
        *state = next;
    }

    /// Take one frame from `feed` and classify it.
    ///
    /// The lock is released before the request is awaited so the state can
    /// be observed (and a second capture rejected) while it is in flight.
    pub async fn capture(&self, feed: &dyn FrameSource) -> CaptureOutcome {
        {
            let mut state = self.lock_state();
            if *state != CaptureState::Idle {
                tracing::debug!("Capture ignored while {}", state.name());
                return CaptureOutcome::Ignored;
            }
            *state = CaptureState::Capturing;
        }

        let Some(screenshot) = feed.screenshot() else {
            tracing::debug!("No frame available from feed");
            self.set_state(CaptureState::Idle);
            return CaptureOutcome::NoFrame;
        };

        let frame = match CapturedFrame::from_data_url(&screenshot) {
            Ok(frame) => frame,
            Err(e) => {
                self.set_state(CaptureState::Idle);
                return self.fail(e);
            }
        };

        *self.lock_error() = None;
        self.set_state(CaptureState::Submitted {
            frame: frame.clone(),
        });
        tracing::info!("Submitting {} byte frame for classification", frame.bytes.len());

        match self.service.classify_image(&frame).await {
            Ok(result) => {
                tracing::info!("Detected {}", result.detected_label);
                self.set_state(CaptureState::Result {
                    frame,
                    result: result.clone(),
                });
                CaptureOutcome::Classified(result)
            }
            Err(e) => {
                self.set_state(CaptureState::Idle);
                self.fail(e)
            }
        }
    }

    fn fail(&self, err: anyhow::Error) -> CaptureOutcome {
        tracing::error!("Error scanning food: {:#}", err);
        let message = user_message(&err);
        if self.policy == ErrorPolicy::Surface {
            *self.lock_error() = Some(message.clone());
        }
        CaptureOutcome::Failed(message)
    }

    /// Discard the result and its frame. Only acts in the `Result` state.
    ///
    /// Returns `true` when the controller went back to `Idle`.
    pub fn reset(&self) -> bool {
        let mut state = self.lock_state();
        if matches!(*state, CaptureState::Result { .. }) {
            *state = CaptureState::Idle;
            drop(state);
            *self.lock_error() = None;
            tracing::debug!("Capture reset");
            true
        } else {
            false
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> CaptureState {
        self.lock_state().clone()
    }

    /// True while a frame is being taken or classified.
    pub fn is_loading(&self) -> bool {
        matches!(
            *self.lock_state(),
            CaptureState::Capturing | CaptureState::Submitted { .. }
        )
    }

    /// The classification on screen, if any.
    pub fn result(&self) -> Option<CaptureResult> {
        match &*self.lock_state() {
            CaptureState::Result { result, .. } => Some(result.clone()),
            _ => None,
        }
    }

    /// The frame being classified or already classified.
    pub fn frame(&self) -> Option<CapturedFrame> {
        match &*self.lock_state() {
            CaptureState::Submitted { frame } | CaptureState::Result { frame, .. } => {
                Some(frame.clone())
            }
            _ => None,
        }
    }

    /// Message of the last failure, kept only under [`ErrorPolicy::Surface`].
    pub fn last_error(&self) -> Option<String> {
        self.lock_error().clone()
    }
}
