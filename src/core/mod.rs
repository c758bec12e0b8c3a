// Core algorithm exports
pub mod error;
pub mod matcher;
pub mod normalize;
pub mod similarity;
pub mod status;
pub mod vocabulary;

pub use error::MatchError;
pub use matcher::{common_subjects_between, score_profiles, MatchResult, Matcher, PairScore};
pub use normalize::{clamp_proficiency, normalize_subject, NormalizedProfile, SubjectSet};
pub use similarity::{cosine_similarity, round_to};
pub use status::{like_message, resolve_like, LikeResolution};
pub use vocabulary::Vocabulary;
