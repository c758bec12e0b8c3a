use crate::models::UserProfile;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when talking to the profile document store
#[derive(Debug, Error)]
pub enum ProfileStoreError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: invalid API key or token")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Client for the document store holding user profiles
///
/// Speaks the Appwrite-style REST API: documents are listed from one collection and
/// filtered with `query` expressions such as `equal("userId", "abc")`.
pub struct ProfileStoreClient {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    collection_id: String,
    client: Client,
}

impl ProfileStoreClient {
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        database_id: String,
        collection_id: String,
        timeout_secs: u64,
    ) -> Result<Self, ProfileStoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            project_id,
            database_id,
            collection_id,
            client,
        })
    }

    fn documents_url(&self, queries: &[String]) -> String {
        let url = format!(
            "{}/databases/{}/collections/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            self.collection_id
        );

        if queries.is_empty() {
            return url;
        }

        let query_string = queries
            .iter()
            .map(|q| format!("queries[]={}", urlencoding::encode(q)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}?{}", url, query_string)
    }

    /// Fetch the `documents` array for a set of queries
    async fn list_documents(&self, queries: &[String]) -> Result<Vec<Value>, ProfileStoreError> {
        let url = self.documents_url(queries);

        tracing::debug!("Listing profile documents: {}", url);

        let response = self
            .client
            .get(&url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProfileStoreError::Unauthorized);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Profile store returned {}: {}", status, body);
            return Err(ProfileStoreError::ApiError(format!(
                "Failed to list documents: {}",
                status
            )));
        }

        let mut json: Value = response.json().await?;

        let documents = match json.get_mut("documents").map(Value::take) {
            Some(Value::Array(documents)) => documents,
            _ => {
                return Err(ProfileStoreError::InvalidResponse(
                    "Missing documents array".into(),
                ))
            }
        };

        // Unwrap `{ "data": {...} }` envelopes
        Ok(documents
            .into_iter()
            .map(|mut doc| match doc.get_mut("data").map(Value::take) {
                Some(data @ Value::Object(_)) => data,
                _ => doc,
            })
            .collect())
    }

    /// Get a single profile by user ID
    pub async fn get_profile(&self, user_id: &str) -> Result<UserProfile, ProfileStoreError> {
        let queries = vec![
            equal_query("userId", &Value::String(user_id.to_string())),
            limit_query(1),
        ];

        let doc = self
            .list_documents(&queries)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                ProfileStoreError::NotFound(format!("Profile not found for user {}", user_id))
            })?;

        serde_json::from_value(doc)
            .map_err(|e| {
                ProfileStoreError::InvalidResponse(format!("Failed to parse profile: {}", e))
            })
    }

    /// Get several profiles in one request
    ///
    /// Documents that fail to parse are logged and left out.
    pub async fn get_profiles(
        &self,
        user_ids: &[String],
    ) -> Result<Vec<UserProfile>, ProfileStoreError> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }

        let ids = Value::Array(user_ids.iter().cloned().map(Value::String).collect());
        let queries = vec![equal_query("userId", &ids), limit_query(user_ids.len())];

        let profiles = self
            .list_documents(&queries)
            .await?
            .into_iter()
            .filter_map(|doc| match serde_json::from_value::<UserProfile>(doc) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    tracing::warn!("Dropping unparseable profile document: {}", e);
                    None
                }
            })
            .collect();

        Ok(profiles)
    }

    /// List the candidate pool for a requester
    ///
    /// Only profile-complete users other than the requester and outside
    /// `exclude_ids` are returned. Documents come back unparsed so that a
    /// malformed record costs one candidate rather than the whole request.
    pub async fn list_candidates(
        &self,
        requester_id: &str,
        exclude_ids: &[String],
        limit: usize,
    ) -> Result<Vec<Value>, ProfileStoreError> {
        let mut queries = vec![
            equal_query("isProfileComplete", &Value::Bool(true)),
            not_equal_query("userId", &Value::String(requester_id.to_string())),
        ];
        for id in exclude_ids {
            queries.push(not_equal_query("userId", &Value::String(id.clone())));
        }
        queries.push(limit_query(limit));

        let documents: Vec<Value> = self
            .list_documents(&queries)
            .await?
            .into_iter()
            // The store may ignore some filters; enforce them here as well
            .filter(|doc| match doc.get("userId").and_then(Value::as_str) {
                Some(id) => id != requester_id && !exclude_ids.iter().any(|e| e == id),
                None => true,
            })
            .filter(|doc| doc.get("isProfileComplete").and_then(Value::as_bool) != Some(false))
            .collect();

        tracing::debug!(
            "Listed {} candidate documents for {} ({} excluded)",
            documents.len(),
            requester_id,
            exclude_ids.len()
        );

        Ok(documents)
    }
}

fn equal_query(attribute: &str, value: &Value) -> String {
    format!("equal(\"{}\", {})", attribute, query_values(value))
}

fn not_equal_query(attribute: &str, value: &Value) -> String {
    format!("notEqual(\"{}\", {})", attribute, query_values(value))
}

fn limit_query(limit: usize) -> String {
    format!("limit({})", limit)
}

/// Query values are always JSON arrays
fn query_values(value: &Value) -> String {
    match value {
        Value::Array(_) => value.to_string(),
        other => Value::Array(vec![other.clone()]).to_string(),
    }
}
