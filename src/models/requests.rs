use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// Request to find matches
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FindMatchesRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    /// Falls back to the configured default when absent
    #[serde(default)]
    #[validate(range(min = 1))]
    pub limit: Option<u16>,
}

/// Stateless scoring request: the caller supplies the whole pool
///
/// Both fields stay raw so the engine can tell a missing requester or a non-array
/// pool (fatal) apart from individual malformed candidates (skipped).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreMatchesRequest {
    #[serde(default)]
    pub requester: Option<Value>,
    #[serde(default)]
    pub candidates: Option<Value>,
}

/// Like, reject or reset a relation to another user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MatchActionRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "target_user_id", rename = "targetUserId")]
    pub target_user_id: String,
}

/// `?userId=` query for the read-only listings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserQuery {
    #[validate(length(min = 1))]
    #[serde(rename = "userId")]
    pub user_id: String,
}
