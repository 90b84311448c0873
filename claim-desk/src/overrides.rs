use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{DeskError, Result};

/// Adjuster annotation on a routing decision.
///
/// Every claim starts at `None`. Once set, an annotation can flip between `Approved` and
/// `Rejected` but never returns to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideStatus {
    #[default]
    None,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideAction {
    Approve,
    Reject,
}

impl OverrideAction {
    pub fn target(self) -> OverrideStatus {
        match self {
            OverrideAction::Approve => OverrideStatus::Approved,
            OverrideAction::Reject => OverrideStatus::Rejected,
        }
    }
}

/// Outcome of applying an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied {
        from: OverrideStatus,
        to: OverrideStatus,
    },
    /// The claim already carried the action's target status.
    Unchanged(OverrideStatus),
}

impl OverrideStatus {
    /// Whether the control for `action` is enabled. The action matching the current status
    /// is disabled.
    pub fn is_enabled(self, action: OverrideAction) -> bool {
        self != action.target()
    }

    pub fn apply(self, action: OverrideAction) -> Transition {
        let to = action.target();
        if self == to {
            Transition::Unchanged(self)
        } else {
            Transition::Applied { from: self, to }
        }
    }

    pub fn label(self) -> Option<&'static str> {
        match self {
            OverrideStatus::None => None,
            OverrideStatus::Approved => Some("Approved"),
            OverrideStatus::Rejected => Some("Rejected"),
        }
    }
}

/// Session-local store of annotations keyed by claim id.
///
/// Nothing here is sent to the classification service.
#[async_trait]
pub trait OverrideStore: Send + Sync {
    /// Records claims the dashboard has seen. Existing annotations are left untouched.
    async fn register(&self, claim_ids: &[String]);
    /// `None` when the claim was never registered.
    async fn status(&self, claim_id: &str) -> Option<OverrideStatus>;
    async fn apply(&self, claim_id: &str, action: OverrideAction) -> Result<Transition>;
    async fn entries(&self) -> Vec<(String, OverrideStatus)>;
}

/// In-memory implementation of OverrideStore
#[derive(Clone, Default)]
pub struct InMemoryOverrideStore {
    statuses: Arc<DashMap<String, OverrideStatus>>,
}

impl InMemoryOverrideStore {
    pub fn new() -> Self {
        Self {
            statuses: Arc::new(DashMap::new()),
        }
    }
}

#[async_trait]
impl OverrideStore for InMemoryOverrideStore {
    async fn register(&self, claim_ids: &[String]) {
        for id in claim_ids {
            self.statuses.entry(id.clone()).or_default();
        }
    }

    async fn status(&self, claim_id: &str) -> Option<OverrideStatus> {
        self.statuses.get(claim_id).map(|entry| *entry)
    }

    async fn apply(&self, claim_id: &str, action: OverrideAction) -> Result<Transition> {
        let mut entry = self
            .statuses
            .get_mut(claim_id)
            .ok_or_else(|| DeskError::UnknownClaim(claim_id.to_string()))?;

        let transition = entry.apply(action);
        if let Transition::Applied { to, .. } = transition {
            *entry = to;
        }
        Ok(transition)
    }

    async fn entries(&self) -> Vec<(String, OverrideStatus)> {
        self.statuses
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }
}
