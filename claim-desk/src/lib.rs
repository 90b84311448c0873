pub mod aggregate;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod input;
pub mod model;
pub mod overrides;
pub mod sequence;
pub mod service;
pub mod submission;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use aggregate::{Bucket, DashboardView, distinct_teams, toggle_team};
pub use config::ClientConfig;
pub use dashboard::{DashboardController, DashboardSnapshot, ReviewRow};
pub use error::{DeskError, Result};
pub use input::{ClaimDraft, ClaimInput, InputMode, normalize};
pub use model::{
    ClaimData, CustomerValue, FraudIndicator, RiskBand, RoutingDecision, Urgency, format_amount,
};
pub use overrides::{
    InMemoryOverrideStore, OverrideAction, OverrideStatus, OverrideStore, Transition,
};
pub use sequence::{RequestSequencer, Ticket};
pub use service::{ClassificationService, HttpClassificationService};
pub use submission::{SubmissionController, SubmissionState};
