use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A subject a user teaches or wants to learn
///
/// Deserialization is lenient: records come from a free-form document store, so a
/// bare string is accepted as a subject without proficiency, a non-string `subject`
/// becomes `None` and a non-numeric `proficiency` becomes `None`. Whether such an
/// entry is usable is decided by the engine, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSubjectEntry")]
pub struct SubjectEntry {
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proficiency: Option<f64>,
}

impl SubjectEntry {
    pub fn new(subject: impl Into<String>, proficiency: u8) -> Self {
        Self {
            subject: Some(subject.into()),
            proficiency: Some(proficiency as f64),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSubjectEntry {
    Name(String),
    Detailed {
        #[serde(default, deserialize_with = "lenient_string")]
        subject: Option<String>,
        #[serde(default, deserialize_with = "lenient_number")]
        proficiency: Option<f64>,
    },
}

impl From<RawSubjectEntry> for SubjectEntry {
    fn from(raw: RawSubjectEntry) -> Self {
        match raw {
            RawSubjectEntry::Name(subject) => Self {
                subject: Some(subject),
                proficiency: None,
            },
            RawSubjectEntry::Detailed { subject, proficiency } => Self { subject, proficiency },
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.filter(|n| n.is_finite()))
}

/// Null or non-string display fields read as empty
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.unwrap_or_default())
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(matches!(Option::<Value>::deserialize(deserializer)?, Some(Value::Bool(true))))
}

/// Unparseable timestamps read as unknown activity
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?
        .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
        .map(|ts| ts.with_timezone(&Utc)))
}

/// `null` reads as an empty list; any other non-array is still an error
fn nullable_subjects<'de, D>(deserializer: D) -> Result<Vec<SubjectEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<SubjectEntry>>::deserialize(deserializer)?.unwrap_or_default())
}

/// User profile as consumed by the matching engine
///
/// Only the id and the subject lists decide whether a record is usable. Display
/// fields and `lastActive` tolerate nulls and wrong types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "userId", alias = "id", alias = "_id")]
    pub user_id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub bio: String,
    #[serde(rename = "subjectsToTeach", default, deserialize_with = "nullable_subjects")]
    pub subjects_to_teach: Vec<SubjectEntry>,
    #[serde(rename = "subjectsToLearn", default, deserialize_with = "nullable_subjects")]
    pub subjects_to_learn: Vec<SubjectEntry>,
    #[serde(rename = "isProfileComplete", default, deserialize_with = "lenient_bool")]
    pub is_profile_complete: bool,
    #[serde(rename = "lastActive", default, deserialize_with = "lenient_timestamp")]
    pub last_active: Option<DateTime<Utc>>,
}

/// A subject the candidate teaches and the requester wants to learn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TheyTeachSubject {
    pub subject: String,
    #[serde(rename = "theirProficiency")]
    pub their_proficiency: u8,
    #[serde(rename = "yourTarget")]
    pub your_target: u8,
}

/// A subject the requester teaches and the candidate wants to learn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YouTeachSubject {
    pub subject: String,
    #[serde(rename = "theirTarget")]
    pub their_target: u8,
    #[serde(rename = "yourProficiency")]
    pub your_proficiency: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommonSubjects {
    #[serde(rename = "theyTeach")]
    pub they_teach: Vec<TheyTeachSubject>,
    #[serde(rename = "youTeach")]
    pub you_teach: Vec<YouTeachSubject>,
}

impl CommonSubjects {
    pub fn is_empty(&self) -> bool {
        self.they_teach.is_empty() && self.you_teach.is_empty()
    }
}

/// Scored match result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCandidate {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub bio: String,
    #[serde(rename = "matchScore")]
    pub match_score: f64,
    #[serde(rename = "commonSubjects")]
    pub common_subjects: CommonSubjects,
    #[serde(rename = "lastActive", skip_serializing_if = "Option::is_none")]
    pub last_active: Option<chrono::DateTime<chrono::Utc>>,
}

/// State of one user's relation to another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "match_status", rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Accepted,
    Rejected,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "pending",
            MatchStatus::Accepted => "accepted",
            MatchStatus::Rejected => "rejected",
        }
    }
}

/// Persisted relation from `user_id` to `target_user_id`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "targetUserId")]
    pub target_user_id: String,
    pub status: MatchStatus,
    #[serde(rename = "matchScore")]
    pub match_score: f64,
    #[serde(rename = "updatedAt")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Engine tuning
#[derive(Debug, Clone, Copy)]
pub struct ScoringConfig {
    /// Candidates must score strictly above this value
    pub min_score: f64,
    /// Decimal places kept in `matchScore`
    pub precision: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_score: 0.1,
            precision: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_entry_object() {
        let entry: SubjectEntry =
            serde_json::from_str(r#"{"subject": "Physics", "proficiency": 4}"#).unwrap();
        assert_eq!(entry.subject.as_deref(), Some("Physics"));
        assert_eq!(entry.proficiency, Some(4.0));
    }

    #[test]
    fn test_subject_entry_bare_string() {
        let entry: SubjectEntry = serde_json::from_str(r#""Chemistry""#).unwrap();
        assert_eq!(entry.subject.as_deref(), Some("Chemistry"));
        assert_eq!(entry.proficiency, None);
    }

    #[test]
    fn test_subject_entry_lenient_fields() {
        let entry: SubjectEntry =
            serde_json::from_str(r#"{"subject": 42, "proficiency": "high"}"#).unwrap();
        assert_eq!(entry.subject, None);
        assert_eq!(entry.proficiency, None);

        let entry: SubjectEntry = serde_json::from_str(r#"{"proficiency": "2"}"#).unwrap();
        assert_eq!(entry.subject, None);
        assert_eq!(entry.proficiency, Some(2.0));
    }

    #[test]
    fn test_profile_defaults_and_aliases() {
        let profile: UserProfile = serde_json::from_str(r#"{"_id": "u1"}"#).unwrap();
        assert_eq!(profile.user_id, "u1");
        assert!(profile.subjects_to_teach.is_empty());
        assert!(!profile.is_profile_complete);
        assert!(profile.last_active.is_none());
    }

    #[test]
    fn test_profile_tolerates_null_display_fields() {
        let profile: UserProfile = serde_json::from_str(
            r#"{
                "userId": "u2",
                "name": null,
                "email": 7,
                "bio": null,
                "isProfileComplete": null,
                "subjectsToLearn": null,
                "subjectsToTeach": [{"subject": "Math", "proficiency": 4}]
            }"#,
        )
        .unwrap();

        assert_eq!(profile.name, "");
        assert_eq!(profile.email, "");
        assert_eq!(profile.bio, "");
        assert!(!profile.is_profile_complete);
        assert!(profile.subjects_to_learn.is_empty());
        assert_eq!(profile.subjects_to_teach.len(), 1);
    }

    #[test]
    fn test_profile_bad_last_active_is_unknown() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"userId": "u3", "lastActive": "last tuesday"}"#).unwrap();
        assert!(profile.last_active.is_none());

        let profile: UserProfile =
            serde_json::from_str(r#"{"userId": "u3", "lastActive": 1714557600}"#).unwrap();
        assert!(profile.last_active.is_none());

        let profile: UserProfile =
            serde_json::from_str(r#"{"userId": "u3", "lastActive": "2024-05-01T10:00:00+02:00"}"#)
                .unwrap();
        assert_eq!(
            profile.last_active.map(|ts| ts.to_rfc3339()),
            Some("2024-05-01T08:00:00+00:00".to_string())
        );
    }

    #[test]
    fn test_match_status_wire_format() {
        assert_eq!(serde_json::to_string(&MatchStatus::Accepted).unwrap(), "\"accepted\"");
        assert_eq!(MatchStatus::Rejected.as_str(), "rejected");
    }
}
