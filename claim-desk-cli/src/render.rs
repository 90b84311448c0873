//! Plain-text views of decisions and the dashboard.

use claim_desk::{
    Bucket, DashboardSnapshot, OverrideAction, ReviewRow, RiskBand, RoutingDecision, format_amount,
};
use std::fmt::{Display, Write};

fn risk_label(band: RiskBand) -> &'static str {
    match band {
        RiskBand::High => "high",
        RiskBand::Medium => "medium",
        RiskBand::Low => "low",
    }
}

fn or_na<T: Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "N/A".to_string())
}

/// Result panel shown right after a submission.
pub fn routing_result(decision: &RoutingDecision) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Claim Routing Result");
    let _ = writeln!(out, "Claim ID: {}", decision.claim_id());
    let _ = writeln!(out, "Assigned Team: {}", decision.assigned_team());
    let _ = writeln!(
        out,
        "Urgency: {}   Risk Score: {}% ({})   Customer Value: {}",
        decision.urgency(),
        decision.risk_percent(),
        risk_label(decision.risk_band()),
        decision.customer_value()
    );
    reasons(&mut out, decision);
    fraud(&mut out, decision);
    out
}

fn reasons(out: &mut String, decision: &RoutingDecision) {
    let _ = writeln!(out, "Routing Reasons:");
    for reason in decision.reasoning() {
        let _ = writeln!(out, "  - {reason}");
    }
}

fn fraud(out: &mut String, decision: &RoutingDecision) {
    if decision.is_potential_fraud() {
        let _ = writeln!(out, "Potential fraud:");
        for indicator in decision.fraud_indicators() {
            let _ = writeln!(out, "  ! {indicator}");
        }
    }
}

/// Full detail view of one decision.
pub fn decision(decision: &RoutingDecision) -> String {
    let mut out = routing_result(decision);
    details(&mut out, decision);
    out
}

fn details(out: &mut String, decision: &RoutingDecision) {
    let data = decision.claim_data();
    let _ = writeln!(out, "Claim Details:");
    let _ = writeln!(out, "  Policyholder Age: {}", or_na(data.policyholder_age));
    let _ = writeln!(out, "  Warranty: {}", or_na(data.warranty.as_deref()));
    let _ = writeln!(out, "  Region: {}", or_na(data.claim_region.as_deref()));
    let _ = writeln!(out, "  Vehicle Brand: {}", or_na(data.vehicle_brand.as_deref()));
    let _ = writeln!(out, "  Claim Amount: {}", format_amount(data.claim_amount_paid));
    let _ = writeln!(out, "  Premium Paid: {}", format_amount(data.premium_amount_paid));
    let _ = writeln!(out, "  Claim Date: {}", or_na(data.claim_date.as_deref()));
    if let Some(text) = &data.raw_text {
        let _ = writeln!(out, "Original Claim Text:\n  {text}");
    }
}

fn distribution<T: Display>(out: &mut String, title: &str, buckets: &[Bucket<T>]) {
    let total: usize = buckets.iter().map(|b| b.count).sum();
    let slices: Vec<String> = buckets
        .iter()
        .map(|b| {
            let share = b.count as f64 * 100.0 / total as f64;
            format!("{}: {} ({share:.0}%)", b.tier, b.count)
        })
        .collect();
    let _ = writeln!(out, "{title}: {}", slices.join(", "));
}

pub fn row(row: &ReviewRow) -> String {
    let d = &row.decision;
    let mut out = String::new();
    let badge = row
        .status
        .label()
        .map(|label| format!(" [{label}]"))
        .unwrap_or_default();

    let _ = writeln!(out, "Claim ID: {}{}", d.claim_id(), badge);
    let _ = writeln!(
        out,
        "  Assigned to: {} | {} | {} | risk {}% | {}",
        d.assigned_team(),
        d.urgency(),
        d.customer_value(),
        d.risk_percent(),
        format_amount(d.claim_data().claim_amount_paid)
    );

    if row.expanded {
        reasons(&mut out, d);
        details(&mut out, d);
        let actions: Vec<&str> = [
            (OverrideAction::Approve, "approve"),
            (OverrideAction::Reject, "reject"),
        ]
        .into_iter()
        .filter(|(action, _)| row.can(*action))
        .map(|(_, name)| name)
        .collect();
        let _ = writeln!(out, "  Adjuster actions: {}", actions.join(", "));
    }
    out
}

pub fn dashboard(snapshot: &DashboardSnapshot) -> String {
    let view = &snapshot.view;
    let mut out = String::new();

    if let Some(error) = &snapshot.error {
        let _ = writeln!(out, "! {}", error.user_message());
    }
    if snapshot.loading {
        let _ = writeln!(out, "Loading claims...");
        return out;
    }

    if !view.is_empty() {
        distribution(&mut out, "Urgency", &view.urgency_distribution);
        distribution(&mut out, "Customer Value", &view.customer_value_distribution);
    }
    if !view.teams.is_empty() {
        let teams: Vec<String> = view
            .teams
            .iter()
            .map(|t| {
                if view.selected_team.as_deref() == Some(t.as_str()) {
                    format!("[{t}]")
                } else {
                    t.clone()
                }
            })
            .collect();
        let _ = writeln!(out, "Teams: {}", teams.join("  "));
        let _ = writeln!(out, "{}", view.summary_line());
    }
    if let Some(at) = snapshot.fetched_at {
        let _ = writeln!(out, "Last refreshed {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    let _ = writeln!(out);

    if view.is_empty() {
        let _ = writeln!(out, "No claims found. Submit a claim to see it here.");
    } else {
        let heading = match &view.selected_team {
            Some(team) => format!("{} Claims for {}", view.total(), team),
            None => format!("{} Claims", view.total()),
        };
        let _ = writeln!(out, "{heading}");
        for r in &snapshot.rows {
            out.push_str(&row(r));
        }
    }
    out
}
