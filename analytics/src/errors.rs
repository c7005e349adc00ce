use thiserror::Error;

/// Errors produced by the analytics transformer and its collaborators
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    /// One of the record sets needed for the report is empty
    #[error("no analytics data for the requested scope")]
    NotFound,

    /// The unscoped records do not contain the campaign found in the date-scoped records.
    /// This points at an upstream consistency problem, not at the caller.
    #[error("no unscoped analytics record for campaign {campaign_id}")]
    PairingMismatch { campaign_id: String },

    /// A collaborator fetch failed (network, upstream 5xx, rate limit)
    #[error("analytics provider unavailable: {0}")]
    Unavailable(String),
}
