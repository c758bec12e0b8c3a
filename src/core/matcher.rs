use std::cmp::Ordering;

use serde_json::Value;

use crate::core::{
    error::MatchError,
    normalize::NormalizedProfile,
    similarity::{cosine_similarity, round_to},
    vocabulary::Vocabulary,
};
use crate::models::{
    CommonSubjects, MatchCandidate, ScoringConfig, TheyTeachSubject, UserProfile, YouTeachSubject,
};

/// Result of the matching process
#[derive(Debug)]
pub struct MatchResult {
    pub matches: Vec<MatchCandidate>,
    pub total_candidates: usize,
    /// Candidates dropped as malformed records
    pub skipped_candidates: usize,
}

/// Directional similarities for one requester/candidate pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairScore {
    /// How well the candidate teaches what the requester wants to learn
    pub teach_match: f64,
    /// How well the requester teaches what the candidate wants to learn
    pub learn_match: f64,
    pub match_score: f64,
}

/// Subject-vector matching engine
///
/// # Pipeline Stages
/// 1. Normalize requester and candidates into local copies
/// 2. Build the per-call subject vocabulary
/// 3. Vectorize teach/learn lists and compute both cosine similarities
/// 4. Overlap gate and score threshold
/// 5. Common-subject enrichment and ranking
///
/// The engine never mutates its inputs and keeps no state between calls.
#[derive(Debug, Clone)]
pub struct Matcher {
    config: ScoringConfig,
}

impl Matcher {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn with_default_config() -> Self {
        Self {
            config: ScoringConfig::default(),
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Rank `candidates` against `requester`
    ///
    /// A candidate sharing the requester's id is excluded. Candidates with a blank
    /// id or a subject entry lacking a subject name are skipped and counted in
    /// `skipped_candidates`.
    pub fn compute_matches(
        &self,
        requester: &UserProfile,
        candidates: &[UserProfile],
    ) -> Result<MatchResult, MatchError> {
        self.rank(requester, candidates, candidates.len(), 0)
    }

    /// Rank candidates given as raw documents
    ///
    /// Documents that do not deserialize into a profile are skipped.
    pub fn compute_matches_from_values(
        &self,
        requester: &UserProfile,
        candidates: &[Value],
    ) -> Result<MatchResult, MatchError> {
        let mut skipped = 0;
        let mut profiles = Vec::with_capacity(candidates.len());

        for document in candidates {
            match parse_candidate_document(document) {
                Ok(profile) => profiles.push(profile),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!("Skipping candidate document: {}", e);
                }
            }
        }

        self.rank(requester, &profiles, candidates.len(), skipped)
    }

    /// Fully raw entry point for callers that forward untrusted JSON
    ///
    /// Fails with `InvalidInput` if the requester is missing or unparseable, or if
    /// `candidates` is not an array.
    pub fn compute_matches_json(
        &self,
        requester: Option<&Value>,
        candidates: Option<&Value>,
    ) -> Result<MatchResult, MatchError> {
        let requester = match requester {
            None | Some(Value::Null) => {
                return Err(MatchError::InvalidInput("requester is required".to_string()))
            }
            Some(value) => serde_json::from_value::<UserProfile>(value.clone()).map_err(|e| {
                MatchError::InvalidInput(format!("requester is not a valid profile: {}", e))
            })?,
        };

        let candidates = match candidates {
            Some(Value::Array(items)) => items.as_slice(),
            Some(other) => {
                return Err(MatchError::InvalidInput(format!(
                    "candidates must be an array, got {}",
                    json_type_name(other)
                )))
            }
            None => return Err(MatchError::InvalidInput("candidates are required".to_string())),
        };

        self.compute_matches_from_values(&requester, candidates)
    }

    /// Score a single pair as it would appear in a ranked result
    ///
    /// Returns 0.0 when the pair would be filtered out. Cosine similarity only
    /// depends on positions where both vectors are non-zero, so the pair-local
    /// vocabulary yields the same score as a full pool.
    pub fn pair_score(
        &self,
        requester: &UserProfile,
        candidate: &UserProfile,
    ) -> Result<f64, MatchError> {
        let result = self.compute_matches(requester, std::slice::from_ref(candidate))?;
        Ok(result.matches.first().map(|m| m.match_score).unwrap_or(0.0))
    }

    fn rank(
        &self,
        requester: &UserProfile,
        candidates: &[UserProfile],
        total_candidates: usize,
        mut skipped_candidates: usize,
    ) -> Result<MatchResult, MatchError> {
        if requester.user_id.trim().is_empty() {
            return Err(MatchError::InvalidInput("requester id is required".to_string()));
        }

        let me = NormalizedProfile::new(&requester.subjects_to_teach, &requester.subjects_to_learn);
        if me.malformed > 0 {
            tracing::warn!(
                "Ignoring {} subject entries without a name on requester {}",
                me.malformed,
                requester.user_id
            );
        }

        // Stage 1: local normalized copies, skipping unusable records
        let mut pool: Vec<(&UserProfile, NormalizedProfile)> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if candidate.user_id == requester.user_id {
                continue;
            }
            match normalize_candidate(candidate) {
                Ok(subjects) => pool.push((candidate, subjects)),
                Err(e) => {
                    skipped_candidates += 1;
                    tracing::warn!("Skipping candidate: {}", e);
                }
            }
        }

        // Stage 2: vocabulary over everyone taking part in this call
        let mut vocabulary = Vocabulary::new();
        vocabulary.extend_from(&me.teach);
        vocabulary.extend_from(&me.learn);
        for (_, subjects) in &pool {
            vocabulary.extend_from(&subjects.teach);
            vocabulary.extend_from(&subjects.learn);
        }

        let my_teach = vocabulary.vectorize(&me.teach);
        let my_learn = vocabulary.vectorize(&me.learn);

        // Stages 3-5
        let mut matches: Vec<MatchCandidate> = pool
            .into_iter()
            .filter(|(_, subjects)| {
                subjects.teach.overlaps(&me.learn) || subjects.learn.overlaps(&me.teach)
            })
            .filter_map(|(profile, subjects)| {
                let their_teach = vocabulary.vectorize(&subjects.teach);
                let their_learn = vocabulary.vectorize(&subjects.learn);

                let score = self.combine(
                    similarity_or_zero(&my_learn, &their_teach, &profile.user_id),
                    similarity_or_zero(&my_teach, &their_learn, &profile.user_id),
                );

                if score.match_score <= self.config.min_score {
                    tracing::trace!(
                        "Candidate {} below threshold: {}",
                        profile.user_id,
                        score.match_score
                    );
                    return None;
                }

                Some(MatchCandidate {
                    user_id: profile.user_id.clone(),
                    name: profile.name.clone(),
                    email: profile.email.clone(),
                    bio: profile.bio.clone(),
                    match_score: score.match_score,
                    common_subjects: common_subjects(&me, &subjects),
                    last_active: profile.last_active,
                })
            })
            .collect();

        // Score descending, then most recently active; stable otherwise
        matches.sort_by(|a, b| {
            b.match_score
                .partial_cmp(&a.match_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.last_active.cmp(&a.last_active))
        });

        tracing::debug!(
            "Scored {} candidates over {} subjects for {}: {} matches, {} skipped",
            total_candidates,
            vocabulary.len(),
            requester.user_id,
            matches.len(),
            skipped_candidates
        );

        Ok(MatchResult {
            matches,
            total_candidates,
            skipped_candidates,
        })
    }

    fn combine(&self, teach_match: f64, learn_match: f64) -> PairScore {
        let combined = ((teach_match + learn_match) / 2.0).clamp(0.0, 1.0);
        PairScore {
            teach_match,
            learn_match,
            match_score: round_to(combined, self.config.precision),
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_config()
    }
}

fn parse_candidate_document(document: &Value) -> Result<UserProfile, MatchError> {
    serde_json::from_value(document.clone()).map_err(|e| {
        let user_id = ["userId", "id", "_id"]
            .iter()
            .find_map(|key| document.get(*key).and_then(Value::as_str))
            .unwrap_or("<unknown>");
        MatchError::MalformedCandidateRecord {
            user_id: user_id.to_string(),
            reason: e.to_string(),
        }
    })
}

/// Score two profiles without the overlap gate or threshold
pub fn score_profiles(
    requester: &UserProfile,
    candidate: &UserProfile,
    precision: u32,
) -> PairScore {
    let me = NormalizedProfile::new(&requester.subjects_to_teach, &requester.subjects_to_learn);
    let them = NormalizedProfile::new(&candidate.subjects_to_teach, &candidate.subjects_to_learn);

    let mut vocabulary = Vocabulary::new();
    for subjects in [&me.teach, &me.learn, &them.teach, &them.learn] {
        vocabulary.extend_from(subjects);
    }

    let teach_match = similarity_or_zero(
        &vocabulary.vectorize(&me.learn),
        &vocabulary.vectorize(&them.teach),
        &candidate.user_id,
    );
    let learn_match = similarity_or_zero(
        &vocabulary.vectorize(&me.teach),
        &vocabulary.vectorize(&them.learn),
        &candidate.user_id,
    );

    Matcher::new(ScoringConfig {
        precision,
        ..ScoringConfig::default()
    })
    .combine(teach_match, learn_match)
}

/// Shared subjects between two profiles, from `requester`'s point of view
pub fn common_subjects_between(requester: &UserProfile, partner: &UserProfile) -> CommonSubjects {
    let me = NormalizedProfile::new(&requester.subjects_to_teach, &requester.subjects_to_learn);
    let them = NormalizedProfile::new(&partner.subjects_to_teach, &partner.subjects_to_learn);
    common_subjects(&me, &them)
}

fn common_subjects(me: &NormalizedProfile, them: &NormalizedProfile) -> CommonSubjects {
    let they_teach = them
        .teach
        .iter()
        .filter_map(|theirs| {
            me.learn.get(&theirs.key).map(|target| TheyTeachSubject {
                subject: theirs.display.clone(),
                their_proficiency: theirs.proficiency,
                your_target: target.proficiency,
            })
        })
        .collect();

    let you_teach = them
        .learn
        .iter()
        .filter_map(|theirs| {
            me.teach.get(&theirs.key).map(|mine| YouTeachSubject {
                subject: theirs.display.clone(),
                their_target: theirs.proficiency,
                your_proficiency: mine.proficiency,
            })
        })
        .collect();

    CommonSubjects { they_teach, you_teach }
}

fn normalize_candidate(candidate: &UserProfile) -> Result<NormalizedProfile, MatchError> {
    if candidate.user_id.trim().is_empty() {
        return Err(MatchError::MalformedCandidateRecord {
            user_id: "<unknown>".to_string(),
            reason: "missing user id".to_string(),
        });
    }

    let subjects =
        NormalizedProfile::new(&candidate.subjects_to_teach, &candidate.subjects_to_learn);
    if subjects.malformed > 0 {
        return Err(MatchError::MalformedCandidateRecord {
            user_id: candidate.user_id.clone(),
            reason: format!("{} subject entries without a subject name", subjects.malformed),
        });
    }

    Ok(subjects)
}

fn similarity_or_zero(a: &[f64], b: &[f64], user_id: &str) -> f64 {
    cosine_similarity(a, b).unwrap_or_else(|e| {
        tracing::error!("Scoring candidate {} as 0: {}", user_id, e);
        0.0
    })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubjectEntry;
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn create_profile(id: &str, teach: &[(&str, u8)], learn: &[(&str, u8)]) -> UserProfile {
        UserProfile {
            user_id: id.to_string(),
            name: format!("User {}", id),
            email: format!("{}@example.com", id),
            bio: String::new(),
            subjects_to_teach: teach.iter().map(|(s, p)| SubjectEntry::new(*s, *p)).collect(),
            subjects_to_learn: learn.iter().map(|(s, p)| SubjectEntry::new(*s, *p)).collect(),
            is_profile_complete: true,
            last_active: None,
        }
    }

    fn create_requester() -> UserProfile {
        create_profile(
            "me",
            &[("Mathematics", 5), ("Physics", 2)],
            &[("Computer Science", 3), ("English", 5)],
        )
    }

    #[test]
    fn test_mirrored_candidate_scores_high() {
        let matcher = Matcher::with_default_config();
        let candidate = create_profile(
            "a",
            &[("Computer Science", 4), ("English", 5)],
            &[("Mathematics", 4), ("Physics", 5)],
        );

        let result = matcher.compute_matches(&create_requester(), &[candidate]).unwrap();

        assert_eq!(result.matches.len(), 1);
        let m = &result.matches[0];
        assert_eq!(m.user_id, "a");
        assert!(m.match_score > 0.9, "score was {}", m.match_score);
        assert_eq!(m.common_subjects.they_teach.len(), 2);
        assert_eq!(m.common_subjects.you_teach.len(), 2);
    }

    #[test]
    fn test_no_shared_subjects_is_absent() {
        let matcher = Matcher::with_default_config();
        let candidate = create_profile("b", &[("Music", 5)], &[("Dance", 3)]);

        let result = matcher.compute_matches(&create_requester(), &[candidate]).unwrap();

        assert!(result.matches.is_empty());
    }

    #[test]
    fn test_low_overlap_below_threshold() {
        let matcher = Matcher::with_default_config();
        let requester =
            create_profile("me", &[("Mathematics", 4)], &[("Chemistry", 1), ("Biology", 3)]);
        let candidate = create_profile("c", &[("Chemistry", 1), ("Music", 3)], &[("Dance", 2)]);

        let score = score_profiles(&requester, &candidate, 3);
        assert_eq!(score.match_score, 0.05);

        let result = matcher.compute_matches(&requester, &[candidate]).unwrap();
        assert!(result.matches.is_empty());
    }

    #[test]
    fn test_perfect_overlap_scores_one() {
        let requester = create_profile("me", &[("Math", 3), ("Physics", 4)], &[("Art", 2)]);
        let candidate = create_profile("p", &[("art", 2)], &[("MATH", 3), ("physics", 4)]);

        let score = score_profiles(&requester, &candidate, 3);

        assert!((score.teach_match - 1.0).abs() < 1e-9);
        assert!((score.learn_match - 1.0).abs() < 1e-9);
        assert_eq!(score.match_score, 1.0);
    }

    #[test]
    fn test_malformed_candidate_skipped() {
        let matcher = Matcher::with_default_config();
        let mut broken = create_profile("broken", &[("English", 5)], &[]);
        broken.subjects_to_teach.push(SubjectEntry { subject: None, proficiency: Some(3.0) });
        let good = create_profile("good", &[("English", 5)], &[("Mathematics", 5)]);

        let result = matcher.compute_matches(&create_requester(), &[broken, good]).unwrap();

        assert_eq!(result.skipped_candidates, 1);
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].user_id, "good");
    }

    #[test]
    fn test_self_is_excluded() {
        let matcher = Matcher::with_default_config();
        let requester = create_profile("me", &[("Math", 3)], &[("Art", 3)]);
        let twin = create_profile("me", &[("Art", 3)], &[("Math", 3)]);

        let result = matcher.compute_matches(&requester, &[twin]).unwrap();

        assert!(result.matches.is_empty());
        assert_eq!(result.skipped_candidates, 0);
    }

    #[test]
    fn test_one_direction_overlap_is_enough() {
        let matcher = Matcher::with_default_config();
        let requester = create_profile("me", &[("Math", 3)], &[("Art", 3)]);
        // Only teaches what the requester wants, learns nothing the requester teaches
        let candidate = create_profile("x", &[("Art", 3)], &[("History", 2)]);

        let result = matcher.compute_matches(&requester, &[candidate]).unwrap();

        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].match_score, 0.5);
        assert!(result.matches[0].common_subjects.you_teach.is_empty());
    }

    #[test]
    fn test_sorted_with_recency_tie_break() {
        let matcher = Matcher::with_default_config();
        let requester = create_profile("me", &[("Math", 3)], &[("Art", 3)]);

        let mut stale = create_profile("stale", &[("Art", 3)], &[("Math", 3)]);
        stale.last_active = Some(Utc::now() - Duration::days(10));
        let mut fresh = create_profile("fresh", &[("Art", 3)], &[("Math", 3)]);
        fresh.last_active = Some(Utc::now());
        let unknown = create_profile("unknown", &[("Art", 3)], &[("Math", 3)]);
        let partial = create_profile("partial", &[("Art", 3)], &[]);

        let result = matcher
            .compute_matches(&requester, &[unknown, partial, stale, fresh])
            .unwrap();

        let ids: Vec<&str> = result.matches.iter().map(|m| m.user_id.as_str()).collect();
        assert_eq!(ids, vec!["fresh", "stale", "unknown", "partial"]);
    }

    #[test]
    fn test_common_subjects_detail() {
        let requester = create_profile("me", &[("Physics", 4)], &[("Spanish", 2)]);
        let partner = create_profile("p", &[(" SPANISH ", 5)], &[("physics", 1)]);

        let common = common_subjects_between(&requester, &partner);

        assert_eq!(
            common.they_teach,
            vec![TheyTeachSubject {
                subject: "SPANISH".to_string(),
                their_proficiency: 5,
                your_target: 2,
            }]
        );
        assert_eq!(
            common.you_teach,
            vec![YouTeachSubject {
                subject: "physics".to_string(),
                their_target: 1,
                your_proficiency: 4,
            }]
        );
    }

    #[test]
    fn test_idempotent_and_input_untouched() {
        let matcher = Matcher::with_default_config();
        let requester = create_requester();
        let candidates = vec![
            create_profile("a", &[(" computer science ", 4)], &[("Mathematics", 4)]),
            create_profile("b", &[("English", 2)], &[]),
        ];
        let requester_before = serde_json::to_value(&requester).unwrap();
        let candidates_before = serde_json::to_value(&candidates).unwrap();

        let first = matcher.compute_matches(&requester, &candidates).unwrap();
        let second = matcher.compute_matches(&requester, &candidates).unwrap();

        assert_eq!(
            serde_json::to_value(&first.matches).unwrap(),
            serde_json::to_value(&second.matches).unwrap()
        );
        assert_eq!(serde_json::to_value(&requester).unwrap(), requester_before);
        assert_eq!(serde_json::to_value(&candidates).unwrap(), candidates_before);
    }

    #[test]
    fn test_blank_requester_id_is_invalid() {
        let matcher = Matcher::with_default_config();
        let requester = create_profile("  ", &[("Math", 3)], &[]);

        let err = matcher.compute_matches(&requester, &[]).unwrap_err();

        assert!(matches!(err, MatchError::InvalidInput(_)));
    }

    #[test]
    fn test_json_entry_point_validation() {
        let matcher = Matcher::with_default_config();
        let requester = json!({
            "userId": "me",
            "subjectsToTeach": [{"subject": "Math", "proficiency": 3}]
        });

        assert!(matches!(
            matcher.compute_matches_json(None, Some(&json!([]))),
            Err(MatchError::InvalidInput(_))
        ));
        assert!(matches!(
            matcher.compute_matches_json(Some(&requester), Some(&json!({"a": 1}))),
            Err(MatchError::InvalidInput(_))
        ));
        assert!(matches!(
            matcher.compute_matches_json(Some(&requester), None),
            Err(MatchError::InvalidInput(_))
        ));

        let result = matcher.compute_matches_json(Some(&requester), Some(&json!([]))).unwrap();
        assert!(result.matches.is_empty());
    }

    #[test]
    fn test_json_entry_point_skips_bad_documents() {
        let matcher = Matcher::with_default_config();
        let requester = json!({"userId": "me", "subjectsToLearn": ["Geometry"]});
        let candidates = json!([
            42,
            {"name": "no id"},
            {"userId": "x", "subjectsToTeach": [{"proficiency": 5}]},
            {"userId": "y", "subjectsToTeach": [{"subject": "geometry", "proficiency": "4"}]}
        ]);

        let result = matcher.compute_matches_json(Some(&requester), Some(&candidates)).unwrap();

        assert_eq!(result.total_candidates, 4);
        assert_eq!(result.skipped_candidates, 3);
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].user_id, "y");
        assert_eq!(result.matches[0].common_subjects.they_teach[0].your_target, 3);
    }

    #[test]
    fn test_pair_score() {
        let matcher = Matcher::with_default_config();
        let requester = create_profile("me", &[("Math", 3)], &[("Art", 3)]);

        let matched = create_profile("a", &[("Art", 3)], &[("Math", 3)]);
        assert_eq!(matcher.pair_score(&requester, &matched).unwrap(), 1.0);

        let unrelated = create_profile("b", &[("Music", 3)], &[]);
        assert_eq!(matcher.pair_score(&requester, &unrelated).unwrap(), 0.0);
    }

    #[test]
    fn test_scores_within_unit_interval() {
        let matcher = Matcher::with_default_config();
        let requester = create_requester();
        let candidates: Vec<UserProfile> = (0..30)
            .map(|i| {
                let subjects = ["Mathematics", "Physics", "Computer Science", "English", "Art"];
                create_profile(
                    &i.to_string(),
                    &[(subjects[i % 5], (i % 5 + 1) as u8), (subjects[(i + 2) % 5], 5)],
                    &[(subjects[(i + 1) % 5], (i % 3 + 1) as u8)],
                )
            })
            .collect();

        let result = matcher.compute_matches(&requester, &candidates).unwrap();

        for m in &result.matches {
            assert!(m.match_score > 0.1 && m.match_score <= 1.0);
        }
        for pair in result.matches.windows(2) {
            assert!(pair[0].match_score >= pair[1].match_score);
        }
    }

    #[test]
    fn test_malformed_document_reports_aliased_id() {
        let skipped_id = |document: Value| match parse_candidate_document(&document) {
            Err(MatchError::MalformedCandidateRecord { user_id, .. }) => user_id,
            other => panic!("expected a malformed record, got {:?}", other),
        };

        assert_eq!(skipped_id(json!({"_id": "x1", "subjectsToTeach": "Math"})), "x1");
        assert_eq!(skipped_id(json!({"id": "x2", "subjectsToLearn": 5})), "x2");
        assert_eq!(skipped_id(json!({"subjectsToLearn": 5})), "<unknown>");
    }
}
