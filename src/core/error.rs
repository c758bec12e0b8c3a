use thiserror::Error;

/// Errors produced by the matching engine
#[derive(Debug, Error, PartialEq)]
pub enum MatchError {
    /// Missing or unusable requester, or a candidate pool that is not a collection.
    /// Fatal to the call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// One candidate's record is unusable. The candidate is skipped.
    #[error("Malformed candidate record {user_id}: {reason}")]
    MalformedCandidateRecord { user_id: String, reason: String },

    /// Vectors built from one vocabulary disagree in length. The pair scores 0.
    #[error("Internal invariant violation: {0}")]
    InternalInvariantViolation(String),
}
