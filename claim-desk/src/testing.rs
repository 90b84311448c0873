//! Fixtures shared by the unit tests.

use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::oneshot;

use crate::{
    error::{DeskError, Result},
    input::ClaimInput,
    model::RoutingDecision,
    service::ClassificationService,
};

pub fn decision(
    claim_id: &str,
    team: &str,
    urgency: &str,
    customer_value: &str,
) -> RoutingDecision {
    serde_json::from_value(json!({
        "claim_id": claim_id,
        "assigned_team": team,
        "urgency": urgency,
        "risk_score": 0.5,
        "customer_value": customer_value,
        "reasoning": ["Routed by rule set"],
        "claim_data": { "claim_id": claim_id }
    }))
    .unwrap()
}

pub enum Reply<T> {
    Ready(Result<T>),
    /// Resolves when the test sends on the paired channel.
    Gated(oneshot::Receiver<Result<T>>),
}

impl<T> Reply<T> {
    async fn resolve(self) -> Result<T> {
        match self {
            Reply::Ready(result) => result,
            Reply::Gated(rx) => rx
                .await
                .unwrap_or_else(|_| Err(DeskError::FetchFailed("gate dropped".into()))),
        }
    }
}

/// A classification service that replays queued replies in order and counts calls.
#[derive(Default)]
pub struct ScriptedService {
    classify_replies: Mutex<VecDeque<Reply<RoutingDecision>>>,
    list_replies: Mutex<VecDeque<Reply<Vec<RoutingDecision>>>>,
    classify_calls: AtomicUsize,
    list_calls: AtomicUsize,
    last_team: Mutex<Option<Option<String>>>,
    last_input: Mutex<Option<ClaimInput>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_classify(&self, reply: Reply<RoutingDecision>) {
        self.classify_replies.lock().unwrap().push_back(reply);
    }

    pub fn push_list(&self, reply: Reply<Vec<RoutingDecision>>) {
        self.list_replies.lock().unwrap().push_back(reply);
    }

    pub fn classify_calls(&self) -> usize {
        self.classify_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn last_team(&self) -> Option<Option<String>> {
        self.last_team.lock().unwrap().clone()
    }

    pub fn last_input(&self) -> Option<ClaimInput> {
        self.last_input.lock().unwrap().clone()
    }

    /// Yields until `calls` reports at least `n`.
    pub async fn wait_for(&self, calls: impl Fn(&Self) -> usize, n: usize) {
        while calls(self) < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl ClassificationService for ScriptedService {
    async fn classify(&self, input: &ClaimInput) -> Result<RoutingDecision> {
        *self.last_input.lock().unwrap() = Some(input.clone());
        let reply = self.classify_replies.lock().unwrap().pop_front();
        self.classify_calls.fetch_add(1, Ordering::SeqCst);
        match reply {
            Some(reply) => reply.resolve().await,
            None => Err(DeskError::SubmissionFailed("no scripted reply".into())),
        }
    }

    async fn list_decisions(&self, team: Option<&str>) -> Result<Vec<RoutingDecision>> {
        *self.last_team.lock().unwrap() = Some(team.map(str::to_string));
        let reply = self.list_replies.lock().unwrap().pop_front();
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        match reply {
            Some(reply) => reply.resolve().await,
            None => Err(DeskError::FetchFailed("no scripted reply".into())),
        }
    }

    async fn get_claim(&self, claim_id: &str) -> Result<RoutingDecision> {
        Err(DeskError::FetchFailed(format!("claim {claim_id} not scripted")))
    }

    async fn health(&self) -> Result<()> {
        Ok(())
    }
}
