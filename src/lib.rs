//! Tutor Match - peer-tutoring matching service
//!
//! Users list subjects they can teach and subjects they want to learn. The
//! [`core`] engine turns those lists into proficiency-weighted vectors over a
//! per-call subject vocabulary and ranks candidates by the mean of two cosine
//! similarities: how well they teach what you want to learn, and how well you
//! teach what they want to learn.
//!
//! The engine is pure. [`services`] and [`routes`] wrap it with profile loading,
//! match status persistence and an HTTP API.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{Matcher, MatchError, MatchResult};
pub use models::{MatchCandidate, MatchStatus, ScoringConfig, SubjectEntry, UserProfile};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let matcher = Matcher::default();
        assert_eq!(matcher.config().min_score, 0.1);
        assert_eq!(matcher.config().precision, 3);
    }
}
