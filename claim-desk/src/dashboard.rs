use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::{
    aggregate::{DashboardView, toggle_team},
    error::{DeskError, Result},
    model::RoutingDecision,
    overrides::{InMemoryOverrideStore, OverrideAction, OverrideStatus, OverrideStore, Transition},
    sequence::{InFlight, RequestSequencer, Ticket},
    service::ClassificationService,
};

/// A visible dashboard row: the decision plus its local annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRow {
    pub decision: RoutingDecision,
    pub status: OverrideStatus,
    pub expanded: bool,
}

impl ReviewRow {
    pub fn can(&self, action: OverrideAction) -> bool {
        self.status.is_enabled(action)
    }
}

/// Everything the dashboard view renders at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub view: DashboardView,
    pub rows: Vec<ReviewRow>,
    pub loading: bool,
    pub error: Option<DeskError>,
    pub fetched_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct DashboardInner {
    decisions: Vec<RoutingDecision>,
    selected_team: Option<String>,
    expanded: Option<String>,
    loading: bool,
    error: Option<DeskError>,
    fetched_at: Option<DateTime<Utc>>,
    sequencer: RequestSequencer,
}

impl DashboardInner {
    fn release(&mut self, ticket: Ticket) {
        if self.sequencer.is_current(ticket) {
            self.loading = false;
        }
    }
}

/// Owns the adjuster dashboard: the last fetched decision list, the team filter, the
/// expanded row and the override annotations.
///
/// The full decision set is fetched unfiltered and the team filter is applied locally, so the
/// team list always reflects every team. Only the most recently started fetch may replace the
/// decision list; older responses are discarded when they land.
#[derive(Clone)]
pub struct DashboardController {
    service: Arc<dyn ClassificationService>,
    overrides: Arc<dyn OverrideStore>,
    inner: Arc<RwLock<DashboardInner>>,
}

impl DashboardController {
    pub fn new(service: Arc<dyn ClassificationService>) -> Self {
        Self::with_override_store(service, Arc::new(InMemoryOverrideStore::new()))
    }

    pub fn with_override_store(
        service: Arc<dyn ClassificationService>,
        overrides: Arc<dyn OverrideStore>,
    ) -> Self {
        Self {
            service,
            overrides,
            inner: Arc::new(RwLock::new(DashboardInner::default())),
        }
    }

    /// Sets the team filter and replaces the decision list with a fresh unfiltered fetch.
    pub async fn fetch(&self, selected_team: Option<&str>) -> Result<DashboardSnapshot> {
        self.inner.write().await.selected_team = selected_team.map(str::to_string);
        self.refresh().await?;
        Ok(self.snapshot().await)
    }

    /// Refetches the full decision list, keeping the current filter and annotations.
    ///
    /// Returns the number of decisions now held. A refresh dropped before its response lands
    /// clears `loading` unless a newer refresh is already under way.
    pub async fn refresh(&self) -> Result<usize> {
        let (ticket, pending) = {
            let mut inner = self.inner.write().await;
            inner.loading = true;
            inner.error = None;
            let ticket = inner.sequencer.issue();
            (ticket, InFlight::new(self.inner.clone(), ticket, DashboardInner::release))
        };

        info!(ticket = ticket.value(), "Fetching adjuster dashboard");
        let outcome = self.service.list_decisions(None).await;

        let mut inner = self.inner.write().await;
        pending.settle();
        if !inner.sequencer.is_current(ticket) {
            warn!(ticket = ticket.value(), "Discarding superseded dashboard response");
            return Err(DeskError::Stale);
        }
        inner.loading = false;

        match outcome {
            Ok(decisions) => {
                let ids: Vec<String> =
                    decisions.iter().map(|d| d.claim_id().to_string()).collect();
                self.overrides.register(&ids).await;

                if inner.expanded.as_ref().is_some_and(|id| !ids.contains(id)) {
                    inner.expanded = None;
                }

                info!(count = decisions.len(), "Dashboard refreshed");
                inner.decisions = decisions;
                inner.fetched_at = Some(Utc::now());
                Ok(inner.decisions.len())
            }
            Err(e) => {
                let e = match e {
                    DeskError::FetchFailed(_) => e,
                    other => DeskError::FetchFailed(other.to_string()),
                };
                error!(error = %e, "Dashboard fetch failed");
                inner.error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Toggles the filter to `team`; picking the active team clears it. No network call.
    pub async fn select_team(&self, team: &str) -> Option<String> {
        let mut inner = self.inner.write().await;
        inner.selected_team = toggle_team(inner.selected_team.as_deref(), team);
        inner.selected_team.clone()
    }

    pub async fn clear_filter(&self) {
        self.inner.write().await.selected_team = None;
    }

    pub async fn selected_team(&self) -> Option<String> {
        self.inner.read().await.selected_team.clone()
    }

    /// Opens the detail panel for `claim_id`, or closes it if already open.
    pub async fn toggle_expanded(&self, claim_id: &str) -> Result<bool> {
        let mut inner = self.inner.write().await;
        if inner.loading {
            return Err(DeskError::Busy);
        }
        if inner.expanded.as_deref() == Some(claim_id) {
            inner.expanded = None;
            Ok(false)
        } else {
            inner.expanded = Some(claim_id.to_string());
            Ok(true)
        }
    }

    /// Records an adjuster decision for `claim_id`. Never touches the backend or the decision.
    pub async fn apply_override(
        &self,
        claim_id: &str,
        action: OverrideAction,
    ) -> Result<Transition> {
        // held across the store call so a refresh cannot start underneath it
        let inner = self.inner.read().await;
        if inner.loading {
            return Err(DeskError::Busy);
        }

        let transition = self.overrides.apply(claim_id, action).await?;
        drop(inner);
        match transition {
            Transition::Applied { from, to } => {
                info!(claim_id = %claim_id, from = ?from, to = ?to, "Override recorded")
            }
            Transition::Unchanged(status) => {
                info!(claim_id = %claim_id, status = ?status, "Override unchanged")
            }
        }
        Ok(transition)
    }

    pub async fn override_status(&self, claim_id: &str) -> OverrideStatus {
        self.overrides.status(claim_id).await.unwrap_or_default()
    }

    /// Annotations on claims missing from the current list. They stay stored but render
    /// nowhere.
    pub async fn orphaned_overrides(&self) -> Vec<(String, OverrideStatus)> {
        let inner = self.inner.read().await;
        let mut orphans: Vec<(String, OverrideStatus)> = self
            .overrides
            .entries()
            .await
            .into_iter()
            .filter(|(id, status)| {
                *status != OverrideStatus::None
                    && !inner.decisions.iter().any(|d| d.claim_id() == id)
            })
            .collect();
        orphans.sort_by(|a, b| a.0.cmp(&b.0));
        orphans
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        let inner = self.inner.read().await;
        let view = DashboardView::compute(&inner.decisions, inner.selected_team.as_deref());

        let mut rows = Vec::with_capacity(view.decisions.len());
        for decision in &view.decisions {
            rows.push(ReviewRow {
                status: self.override_status(decision.claim_id()).await,
                expanded: inner.expanded.as_deref() == Some(decision.claim_id()),
                decision: decision.clone(),
            });
        }

        DashboardSnapshot {
            view,
            rows,
            loading: inner.loading,
            error: inner.error.clone(),
            fetched_at: inner.fetched_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Reply, ScriptedService, decision};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::oneshot;

    fn controller() -> (Arc<ScriptedService>, DashboardController) {
        let service = Arc::new(ScriptedService::new());
        let controller = DashboardController::new(service.clone());
        (service, controller)
    }

    fn first_batch() -> Vec<RoutingDecision> {
        vec![
            decision("C-1", "High Value Claims", "High", "VIP"),
            decision("C-2", "Standard Claims", "Low", "Standard"),
            decision("C-3", "Legal Claims", "Medium", "Premium"),
        ]
    }

    #[tokio::test]
    async fn fetch_loads_unfiltered_and_filters_locally() {
        let (service, controller) = controller();
        service.push_list(Reply::Ready(Ok(first_batch())));

        let snapshot = controller.fetch(Some("Legal Claims")).await.unwrap();

        assert_eq!(service.last_team(), Some(None));
        assert_eq!(snapshot.view.teams.len(), 3);
        assert_eq!(snapshot.rows.len(), 1);
        assert_eq!(snapshot.rows[0].decision.claim_id(), "C-3");
        assert!(snapshot.fetched_at.is_some());
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn selecting_a_team_does_not_refetch() {
        let (service, controller) = controller();
        service.push_list(Reply::Ready(Ok(first_batch())));
        controller.refresh().await.unwrap();

        assert_eq!(
            controller.select_team("Standard Claims").await.as_deref(),
            Some("Standard Claims")
        );
        let filtered = controller.snapshot().await;
        assert_eq!(filtered.view.total(), 1);
        assert_eq!(filtered.view.teams.len(), 3);

        assert_eq!(controller.select_team("Standard Claims").await, None);
        assert_eq!(controller.snapshot().await.view.total(), 3);
        assert_eq!(service.list_calls(), 1);
    }

    #[tokio::test]
    async fn overrides_survive_refetch_and_go_inert_when_claim_disappears() {
        let (service, controller) = controller();
        service.push_list(Reply::Ready(Ok(first_batch())));
        service.push_list(Reply::Ready(Ok(vec![
            decision("C-1", "High Value Claims", "High", "VIP"),
            decision("C-3", "Legal Claims", "Medium", "Premium"),
        ])));
        controller.refresh().await.unwrap();

        controller.apply_override("C-1", OverrideAction::Approve).await.unwrap();
        controller.apply_override("C-2", OverrideAction::Reject).await.unwrap();

        controller.refresh().await.unwrap();
        let snapshot = controller.snapshot().await;

        let c1 = snapshot.rows.iter().find(|r| r.decision.claim_id() == "C-1").unwrap();
        assert_eq!(c1.status, OverrideStatus::Approved);
        assert!(!c1.can(OverrideAction::Approve));
        assert!(c1.can(OverrideAction::Reject));
        assert!(snapshot.rows.iter().all(|r| r.decision.claim_id() != "C-2"));
        assert_eq!(
            controller.orphaned_overrides().await,
            vec![("C-2".to_string(), OverrideStatus::Rejected)]
        );
    }

    #[tokio::test]
    async fn overrides_do_not_touch_decisions_or_distributions() {
        let (service, controller) = controller();
        service.push_list(Reply::Ready(Ok(first_batch())));
        controller.refresh().await.unwrap();
        let before = controller.snapshot().await;

        controller.apply_override("C-1", OverrideAction::Reject).await.unwrap();
        let again = controller.apply_override("C-1", OverrideAction::Reject).await.unwrap();
        let after = controller.snapshot().await;

        assert_eq!(again, Transition::Unchanged(OverrideStatus::Rejected));
        assert_eq!(before.view, after.view);
        assert_eq!(after.rows[0].decision.assigned_team(), "High Value Claims");
        assert_eq!(service.list_calls(), 1);
    }

    #[tokio::test]
    async fn unseen_claims_cannot_be_annotated() {
        let (_service, controller) = controller();
        assert_eq!(
            controller.apply_override("C-77", OverrideAction::Approve).await,
            Err(DeskError::UnknownClaim("C-77".to_string()))
        );
    }

    #[tokio::test]
    async fn stale_response_is_discarded() {
        let (service, controller) = controller();
        let (old_tx, old_rx) = oneshot::channel();
        let (new_tx, new_rx) = oneshot::channel();
        service.push_list(Reply::Gated(old_rx));
        service.push_list(Reply::Gated(new_rx));

        let older = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.refresh().await })
        };
        service.wait_for(ScriptedService::list_calls, 1).await;
        let newer = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.refresh().await })
        };
        service.wait_for(ScriptedService::list_calls, 2).await;

        new_tx
            .send(Ok(vec![decision("C-NEW", "Standard Claims", "Low", "Standard")]))
            .unwrap();
        assert_eq!(newer.await.unwrap(), Ok(1));

        old_tx.send(Ok(first_batch())).unwrap();
        assert_eq!(older.await.unwrap(), Err(DeskError::Stale));

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.rows.len(), 1);
        assert_eq!(snapshot.rows[0].decision.claim_id(), "C-NEW");
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn loading_blocks_detail_interactions() {
        let (service, controller) = controller();
        service.push_list(Reply::Ready(Ok(first_batch())));
        let (tx, rx) = oneshot::channel();
        service.push_list(Reply::Gated(rx));
        controller.refresh().await.unwrap();
        controller.apply_override("C-3", OverrideAction::Approve).await.unwrap();

        let pending = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.refresh().await })
        };
        service.wait_for(ScriptedService::list_calls, 2).await;

        assert!(controller.snapshot().await.loading);
        assert_eq!(controller.toggle_expanded("C-1").await, Err(DeskError::Busy));
        assert_eq!(
            controller.apply_override("C-1", OverrideAction::Approve).await,
            Err(DeskError::Busy)
        );
        assert_eq!(controller.override_status("C-3").await, OverrideStatus::Approved);

        tx.send(Ok(first_batch())).unwrap();
        pending.await.unwrap().unwrap();
        assert!(controller.toggle_expanded("C-1").await.unwrap());
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_list_and_is_retryable() {
        let (service, controller) = controller();
        service.push_list(Reply::Ready(Ok(first_batch())));
        service.push_list(Reply::Ready(Err(DeskError::FetchFailed("timed out".into()))));
        service.push_list(Reply::Ready(Ok(first_batch())));

        controller.refresh().await.unwrap();
        let err = controller.refresh().await.unwrap_err();
        let snapshot = controller.snapshot().await;
        assert_eq!(err.user_message(), "Failed to fetch claims. Please try again.");
        assert_eq!(snapshot.error, Some(err));
        assert_eq!(snapshot.rows.len(), 3);

        controller.refresh().await.unwrap();
        assert_eq!(controller.snapshot().await.error, None);
    }

    #[tokio::test]
    async fn expanded_row_toggles_and_closes_when_claim_vanishes() {
        let (service, controller) = controller();
        service.push_list(Reply::Ready(Ok(first_batch())));
        service.push_list(Reply::Ready(Ok(vec![decision(
            "C-9",
            "Legal Claims",
            "Low",
            "Standard",
        )])));
        controller.refresh().await.unwrap();

        assert!(controller.toggle_expanded("C-2").await.unwrap());
        assert!(controller.snapshot().await.rows[1].expanded);
        assert!(!controller.toggle_expanded("C-2").await.unwrap());
        assert!(controller.toggle_expanded("C-2").await.unwrap());

        controller.refresh().await.unwrap();
        assert!(controller.snapshot().await.rows.iter().all(|r| !r.expanded));
    }

    #[tokio::test]
    async fn cancelled_refresh_clears_loading() {
        let (service, controller) = controller();
        service.push_list(Reply::Ready(Ok(first_batch())));
        let (_tx, rx) = oneshot::channel();
        service.push_list(Reply::Gated(rx));
        service.push_list(Reply::Ready(Ok(first_batch())));
        controller.refresh().await.unwrap();

        let abandoned = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.refresh().await })
        };
        service.wait_for(ScriptedService::list_calls, 2).await;
        assert!(controller.snapshot().await.loading);

        abandoned.abort();
        assert!(abandoned.await.unwrap_err().is_cancelled());

        assert!(!controller.snapshot().await.loading);
        assert_eq!(
            controller.apply_override("C-1", OverrideAction::Approve).await,
            Ok(Transition::Applied {
                from: OverrideStatus::None,
                to: OverrideStatus::Approved
            })
        );
        assert!(controller.toggle_expanded("C-1").await.unwrap());
        assert_eq!(controller.refresh().await, Ok(3));
    }

    #[tokio::test]
    async fn cancelling_an_older_refresh_keeps_the_newer_one_loading() {
        let (service, controller) = controller();
        let (_old_tx, old_rx) = oneshot::channel();
        let (new_tx, new_rx) = oneshot::channel();
        service.push_list(Reply::Gated(old_rx));
        service.push_list(Reply::Gated(new_rx));

        let older = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.refresh().await })
        };
        service.wait_for(ScriptedService::list_calls, 1).await;
        let newer = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.refresh().await })
        };
        service.wait_for(ScriptedService::list_calls, 2).await;

        older.abort();
        assert!(older.await.unwrap_err().is_cancelled());
        assert!(controller.snapshot().await.loading);

        new_tx.send(Ok(first_batch())).unwrap();
        assert_eq!(newer.await.unwrap(), Ok(3));
        assert!(!controller.snapshot().await.loading);
    }

    /// Holds `apply` open until the test releases it.
    #[derive(Default)]
    struct HeldStore {
        store: InMemoryOverrideStore,
        entered: AtomicBool,
        gate: Mutex<Option<oneshot::Receiver<()>>>,
    }

    #[async_trait]
    impl OverrideStore for HeldStore {
        async fn register(&self, claim_ids: &[String]) {
            self.store.register(claim_ids).await
        }

        async fn status(&self, claim_id: &str) -> Option<OverrideStatus> {
            self.store.status(claim_id).await
        }

        async fn apply(&self, claim_id: &str, action: OverrideAction) -> Result<Transition> {
            self.entered.store(true, Ordering::SeqCst);
            let gate = self.gate.lock().unwrap().take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            self.store.apply(claim_id, action).await
        }

        async fn entries(&self) -> Vec<(String, OverrideStatus)> {
            self.store.entries().await
        }
    }

    #[tokio::test]
    async fn refresh_waits_for_an_override_in_progress() {
        let service = Arc::new(ScriptedService::new());
        let store = Arc::new(HeldStore::default());
        let controller = DashboardController::with_override_store(service.clone(), store.clone());
        service.push_list(Reply::Ready(Ok(first_batch())));
        service.push_list(Reply::Ready(Ok(first_batch())));
        controller.refresh().await.unwrap();

        let (release, gate) = oneshot::channel();
        *store.gate.lock().unwrap() = Some(gate);
        let approving = {
            let controller = controller.clone();
            tokio::spawn(async move {
                controller.apply_override("C-2", OverrideAction::Approve).await
            })
        };
        while !store.entered.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }

        let refreshing = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.refresh().await })
        };
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(service.list_calls(), 1);

        release.send(()).unwrap();
        assert!(matches!(approving.await.unwrap(), Ok(Transition::Applied { .. })));
        assert_eq!(refreshing.await.unwrap(), Ok(3));
        assert_eq!(controller.override_status("C-2").await, OverrideStatus::Approved);
    }
}
