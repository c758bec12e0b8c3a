use serde::{Deserialize, Serialize};
use crate::models::domain::{CommonSubjects, MatchCandidate, MatchStatus};

/// Response for the find and score endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindMatchesResponse {
    pub matches: Vec<MatchCandidate>,
    #[serde(rename = "totalCandidates")]
    pub total_candidates: usize,
    #[serde(rename = "skippedCandidates")]
    pub skipped_candidates: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

/// Event produced for the target when a like completes a mutual match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchNotification {
    #[serde(rename = "eventId")]
    pub event_id: String,
    #[serde(rename = "recipientId")]
    pub recipient_id: String,
    #[serde(rename = "fromUserId")]
    pub from_user_id: String,
    #[serde(rename = "fromUserName")]
    pub from_user_name: String,
    #[serde(rename = "matchedAt")]
    pub matched_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeResponse {
    pub matched: bool,
    pub status: MatchStatus,
    #[serde(rename = "matchScore")]
    pub match_score: f64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<MatchNotification>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangeResponse {
    pub success: bool,
    pub message: String,
}

/// A mutual match with the partner's profile details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub bio: String,
    #[serde(rename = "matchScore")]
    pub match_score: f64,
    #[serde(rename = "matchedAt")]
    pub matched_at: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "commonSubjects")]
    pub common_subjects: CommonSubjects,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionsResponse {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub connections: Vec<Connection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingMatch {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "matchScore")]
    pub match_score: f64,
    #[serde(rename = "requestedAt")]
    pub requested_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingResponse {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub pending: Vec<PendingMatch>,
}
