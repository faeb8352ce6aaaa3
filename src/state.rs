//! Loading/success/error lifecycle of a single interpretation request

use crate::ai::InterpretationService;
use crate::models::{DreamRequest, Interpretation};
use crate::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ContentState<T> {
    Loading,
    Success(T),
    Error(String),
}

impl<T> ContentState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Drives one dream's interpretation and publishes each state transition.
///
/// A session starts in `Loading`. Each `run` resets to `Loading` and ends
/// in `Success` or `Error`; `retry` is a fresh `run`.
pub struct InterpretationSession {
    service: Arc<dyn InterpretationService>,
    request: DreamRequest,
    state: watch::Sender<ContentState<Interpretation>>,
    in_flight: AtomicBool,
}

impl InterpretationSession {
    pub fn new(service: Arc<dyn InterpretationService>, request: DreamRequest) -> Self {
        let (state, _) = watch::channel(ContentState::Loading);
        Self {
            service,
            request,
            state,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> ContentState<Interpretation> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ContentState<Interpretation>> {
        self.state.subscribe()
    }

    /// True while a call is outstanding; callers disable their trigger.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub async fn run(&self) -> Result<Interpretation> {
        self.run_with_cancel(&CancellationToken::new()).await
    }

    pub async fn retry(&self) -> Result<Interpretation> {
        info!("Retrying interpretation");
        self.run().await
    }

    /// Like [`run`](Self::run), but abandons the call when `cancel` fires.
    /// A cancelled call leaves the state untouched.
    pub async fn run_with_cancel(&self, cancel: &CancellationToken) -> Result<Interpretation> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            warn!("Interpretation requested while another is in flight");
            return Err(Error::Busy);
        }
        let _guard = InFlight(&self.in_flight);

        self.state.send_replace(ContentState::Loading);

        let outcome = tokio::select! {
            _ = cancel.cancelled() => {
                info!("Interpretation cancelled by caller");
                return Err(Error::Cancelled);
            }
            outcome = self.service.interpret(&self.request) => outcome,
        };

        match &outcome {
            Ok(interpretation) => {
                self.state
                    .send_replace(ContentState::Success(interpretation.clone()));
            }
            Err(e) => {
                warn!("Interpretation failed: {}", e);
                self.state.send_replace(ContentState::Error(e.to_string()));
            }
        }
        outcome
    }
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
