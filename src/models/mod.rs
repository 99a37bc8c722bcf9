// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Candidate, CompatibilityWeights, FactorBreakdown, MatchStatus, MatchedPair, UserRole,
};
pub use requests::{CancelMatchRequest, ListMatchesQuery};
pub use responses::{
    CancelMatchResponse, CreatedMatch, ErrorResponse, HealthResponse, ListMatchesResponse,
    MatchAvailabilityResponse, MatchRunStats, Pagination, ParticipantInfo, RunMatchesResponse,
    UserMatchResponse,
};
