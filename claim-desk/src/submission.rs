use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::{
    error::{DeskError, Result},
    input::{ClaimDraft, InputMode},
    model::RoutingDecision,
    sequence::{InFlight, RequestSequencer, Ticket},
    service::ClassificationService,
};

/// What the submission view renders.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    /// A request is in flight; no previous result is shown.
    Submitting,
    Succeeded(RoutingDecision),
    /// Idle with an error banner. Always retryable.
    Failed(DeskError),
}

impl SubmissionState {
    pub fn result(&self) -> Option<&RoutingDecision> {
        match self {
            SubmissionState::Succeeded(decision) => Some(decision),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&DeskError> {
        match self {
            SubmissionState::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, SubmissionState::Submitting)
    }
}

#[derive(Debug, Default)]
struct SubmissionInner {
    draft: ClaimDraft,
    state: SubmissionState,
    // tells a cancelled submit which request it was, so it only resets its own `Submitting`
    sequencer: RequestSequencer,
}

impl SubmissionInner {
    fn release(&mut self, ticket: Ticket) {
        if self.sequencer.is_current(ticket) && self.state.is_submitting() {
            self.state = SubmissionState::Idle;
        }
    }
}

/// Drives the claim intake flow: `idle → submitting → succeeded | failed`.
///
/// Cheap to clone; clones share state. At most one submission is outstanding at a time.
#[derive(Clone)]
pub struct SubmissionController {
    service: Arc<dyn ClassificationService>,
    inner: Arc<RwLock<SubmissionInner>>,
}

impl SubmissionController {
    pub fn new(service: Arc<dyn ClassificationService>) -> Self {
        Self {
            service,
            inner: Arc::new(RwLock::new(SubmissionInner::default())),
        }
    }

    pub async fn draft(&self) -> ClaimDraft {
        self.inner.read().await.draft.clone()
    }

    pub async fn state(&self) -> SubmissionState {
        self.inner.read().await.state.clone()
    }

    pub async fn set_text(&self, text: impl Into<String>) {
        self.inner.write().await.draft.set_text(text);
    }

    pub async fn set_structured(&self, structured: impl Into<String>) {
        self.inner.write().await.draft.set_structured(structured);
    }

    pub async fn load_example(&self) {
        self.inner.write().await.draft.load_example();
    }

    /// Activates `mode` and clears any displayed result. Typed input is kept.
    pub async fn switch_mode(&self, mode: InputMode) {
        let mut inner = self.inner.write().await;
        inner.draft.set_mode(mode);
        if matches!(inner.state, SubmissionState::Succeeded(_)) {
            inner.state = SubmissionState::Idle;
        }
    }

    /// Whether the submit control is enabled.
    pub async fn can_submit(&self) -> bool {
        let inner = self.inner.read().await;
        !inner.state.is_submitting() && inner.draft.can_submit()
    }

    pub async fn dismiss_error(&self) {
        let mut inner = self.inner.write().await;
        if matches!(inner.state, SubmissionState::Failed(_)) {
            inner.state = SubmissionState::Idle;
        }
    }

    /// Normalizes the draft and sends it for classification.
    ///
    /// Input errors fail locally without a network call. While a request is in flight a
    /// second call fails with `SubmissionInProgress` and leaves the state untouched. Dropping
    /// the returned future before it resolves puts the controller back to `Idle`.
    pub async fn submit(&self) -> Result<RoutingDecision> {
        let (payload, pending) = {
            let mut inner = self.inner.write().await;
            if inner.state.is_submitting() {
                return Err(DeskError::SubmissionInProgress);
            }

            let payload = match inner.draft.normalize() {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(error = %e, mode = ?inner.draft.mode(), "Claim input rejected");
                    inner.state = SubmissionState::Failed(e.clone());
                    return Err(e);
                }
            };

            inner.state = SubmissionState::Submitting;
            let ticket = inner.sequencer.issue();
            info!(mode = ?payload.mode(), ticket = ticket.value(), "Submitting claim");
            (payload, InFlight::new(self.inner.clone(), ticket, SubmissionInner::release))
        };

        let outcome = self.service.classify(&payload).await;

        let mut inner = self.inner.write().await;
        pending.settle();

        match outcome {
            Ok(decision) => {
                info!(
                    claim_id = %decision.claim_id(),
                    team = %decision.assigned_team(),
                    "Claim routed"
                );
                inner.state = SubmissionState::Succeeded(decision.clone());
                Ok(decision)
            }
            Err(e) => {
                let e = match e {
                    DeskError::SubmissionFailed(_) => e,
                    other => DeskError::SubmissionFailed(other.to_string()),
                };
                error!(error = %e, "Claim submission failed");
                inner.state = SubmissionState::Failed(e.clone());
                Err(e)
            }
        }
    }
}
