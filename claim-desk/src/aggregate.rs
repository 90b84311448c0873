//! Derived dashboard views.
//!
//! Everything here is a pure function of the decision list and the selected team. Views are
//! rebuilt from scratch on every change; nothing is cached between calls.

use serde::Serialize;

use crate::model::{CustomerValue, RoutingDecision, Tiered, Urgency};

/// One non-empty slice of a distribution chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket<T> {
    pub tier: T,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    /// Distinct teams in the unfiltered list, in order of first appearance.
    pub teams: Vec<String>,
    pub selected_team: Option<String>,
    /// Decisions visible under the current filter, in fetch order.
    pub decisions: Vec<RoutingDecision>,
    pub urgency_distribution: Vec<Bucket<Urgency>>,
    pub customer_value_distribution: Vec<Bucket<CustomerValue>>,
}

impl DashboardView {
    pub fn compute(decisions: &[RoutingDecision], selected_team: Option<&str>) -> Self {
        let filtered: Vec<RoutingDecision> = match selected_team {
            Some(team) => decisions
                .iter()
                .filter(|d| d.assigned_team() == team)
                .cloned()
                .collect(),
            None => decisions.to_vec(),
        };

        Self {
            teams: distinct_teams(decisions),
            selected_team: selected_team.map(str::to_string),
            urgency_distribution: distribution(&filtered, RoutingDecision::urgency),
            customer_value_distribution: distribution(&filtered, RoutingDecision::customer_value),
            decisions: filtered,
        }
    }

    pub fn total(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn summary_line(&self) -> String {
        match &self.selected_team {
            Some(team) => format!("Showing {} claims for {}", self.total(), team),
            None => "Showing all claims".to_string(),
        }
    }
}

/// Next filter value after the user picks `clicked`: picking the active team clears it.
pub fn toggle_team(current: Option<&str>, clicked: &str) -> Option<String> {
    if current == Some(clicked) {
        None
    } else {
        Some(clicked.to_string())
    }
}

pub fn distinct_teams(decisions: &[RoutingDecision]) -> Vec<String> {
    let mut teams: Vec<String> = Vec::new();
    for decision in decisions {
        if !teams.iter().any(|t| t == decision.assigned_team()) {
            teams.push(decision.assigned_team().to_string());
        }
    }
    teams
}

/// Counts per known tier, most severe first. Empty tiers and unrecognised labels are left out.
pub fn distribution<T, F>(decisions: &[RoutingDecision], key: F) -> Vec<Bucket<T>>
where
    T: Tiered,
    F: Fn(&RoutingDecision) -> &T,
{
    T::tiers()
        .into_iter()
        .map(|tier| {
            let count = decisions.iter().filter(|d| *key(d) == tier).count();
            Bucket { tier, count }
        })
        .filter(|bucket| bucket.count > 0)
        .collect()
}
