use serde::{Deserialize, Serialize};

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
    pub status_code: u16,
}

/// Statistics for one automatic matching run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchRunStats {
    #[serde(rename = "totalNewcomers")]
    pub total_newcomers: usize,
    #[serde(rename = "totalVeterans")]
    pub total_veterans: usize,
    pub comparisons: usize,
    #[serde(rename = "compatiblePairs")]
    pub compatible_pairs: usize,
    #[serde(rename = "matchesCreated")]
    pub matches_created: usize,
    #[serde(rename = "matchesUpdated")]
    pub matches_updated: usize,
    #[serde(rename = "matchesDeactivated")]
    pub matches_deactivated: usize,
    #[serde(rename = "matchesSkipped")]
    pub matches_skipped: usize,
    #[serde(rename = "scoringErrors")]
    pub scoring_errors: usize,
    #[serde(rename = "averageScore")]
    pub average_score: f64,
}

/// Response for the automatic matching endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMatchesResponse {
    pub success: bool,
    pub message: String,
    pub matches: Vec<CreatedMatch>,
    pub statistics: MatchRunStats,
}

/// One pairing as reported by the automatic matching endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedMatch {
    pub newcomer: ParticipantInfo,
    pub veteran: ParticipantInfo,
    pub score: f64,
}

/// Public identity of one match participant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
}

/// Pagination metadata for list endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
}

/// Response for the match listing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMatchesResponse {
    pub success: bool,
    pub matches: Vec<crate::services::MatchSummary>,
    pub pagination: Pagination,
}

/// Response for the per-user match lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMatchResponse {
    pub success: bool,
    #[serde(rename = "hasMatch")]
    pub has_match: bool,
    pub data: Option<crate::services::UserMatchView>,
}

/// Response for the availability status endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchAvailabilityResponse {
    pub success: bool,
    #[serde(rename = "availableNewcomers")]
    pub available_newcomers: usize,
    #[serde(rename = "availableVeterans")]
    pub available_veterans: usize,
    #[serde(rename = "canRunMatching")]
    pub can_run_matching: bool,
}

/// Response for the cancellation endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelMatchResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "matchId")]
    pub match_id: i64,
}
