use thiserror::Error;

/// Failures surfaced by the claim desk.
///
/// Local input problems (`EmptyInput`, `MalformedStructuredData`) block a submission before
/// any network traffic. Remote problems (`SubmissionFailed`, `FetchFailed`) are always
/// treated as transient: the caller may retry indefinitely.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeskError {
    #[error("Claim input is empty")]
    EmptyInput,

    #[error("Malformed structured data: {0}")]
    MalformedStructuredData(String),

    #[error("Submission failed: {0}")]
    SubmissionFailed(String),

    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    #[error("A submission is already in flight")]
    SubmissionInProgress,

    #[error("Dashboard is loading")]
    Busy,

    #[error("Response superseded by a newer request")]
    Stale,

    #[error("Unknown claim: {0}")]
    UnknownClaim(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DeskError {
    /// The sentence shown to the user in the error banner.
    ///
    /// Remote failures collapse to one generic message regardless of status code or body.
    pub fn user_message(&self) -> String {
        match self {
            DeskError::EmptyInput => "Please enter claim details before submitting.".to_string(),
            DeskError::MalformedStructuredData(_) => {
                "Invalid JSON format. Please check your input.".to_string()
            }
            DeskError::SubmissionFailed(_) => {
                "Failed to submit claim. Please try again.".to_string()
            }
            DeskError::FetchFailed(_) => "Failed to fetch claims. Please try again.".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether the failure came from the classification service rather than local input.
    pub fn is_remote(&self) -> bool {
        matches!(self, DeskError::SubmissionFailed(_) | DeskError::FetchFailed(_))
    }
}

pub type Result<T> = std::result::Result<T, DeskError>;
