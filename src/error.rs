use thiserror::Error;

/// Failures surfaced by conversation resolution.
///
/// Duplicate conversation rows found during lookup are deliberately not an
/// error: the earliest row is returned and the anomaly is logged for offline
/// cleanup.
#[derive(Debug, Error)]
pub enum LinkError {
    /// No authenticated caller identity was available.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The counterpart identity is missing or equal to the caller.
    #[error("invalid participants: {0}")]
    InvalidParticipants(&'static str),

    /// The conversation store could not be reached or rejected the request.
    /// Retryable by the caller; no retry is attempted here.
    #[error("conversation store unavailable")]
    StoreUnavailable(#[from] sqlx::Error),
}
