// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    CommonSubjects, MatchCandidate, MatchRecord, MatchStatus, ScoringConfig, SubjectEntry,
    TheyTeachSubject, UserProfile, YouTeachSubject,
};
pub use requests::{FindMatchesRequest, MatchActionRequest, ScoreMatchesRequest, UserQuery};
pub use responses::{
    Connection, ConnectionsResponse, ErrorResponse, FindMatchesResponse, HealthResponse,
    LikeResponse, MatchNotification, PendingMatch, PendingResponse, StatusChangeResponse,
};
