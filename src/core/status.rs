use crate::models::MatchStatus;

/// What a like does to both sides of a relation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeResolution {
    /// New status of the liker's relation to the target
    pub requester_status: MatchStatus,
    /// New status of the target's relation to the liker, if it changes
    pub target_status: Option<MatchStatus>,
    pub is_mutual: bool,
    /// The target should be told about a newly formed match
    pub notify_target: bool,
}

/// Resolve a like given the target's current relation to the liker
///
/// A pending reverse relation completes the match: both sides become accepted
/// and must be written together.
pub fn resolve_like(reverse: Option<MatchStatus>) -> LikeResolution {
    match reverse {
        Some(MatchStatus::Pending) => LikeResolution {
            requester_status: MatchStatus::Accepted,
            target_status: Some(MatchStatus::Accepted),
            is_mutual: true,
            notify_target: true,
        },
        Some(MatchStatus::Accepted) => LikeResolution {
            requester_status: MatchStatus::Accepted,
            target_status: None,
            is_mutual: true,
            notify_target: false,
        },
        Some(MatchStatus::Rejected) | None => LikeResolution {
            requester_status: MatchStatus::Pending,
            target_status: None,
            is_mutual: false,
            notify_target: false,
        },
    }
}

/// Response message for a resolved like
pub fn like_message(resolution: &LikeResolution) -> &'static str {
    if resolution.notify_target {
        "It's a match!"
    } else if resolution.is_mutual {
        "Already matched"
    } else {
        "Match request sent"
    }
}
