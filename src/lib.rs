//! PadUni Match - Mentor pairing service for the PadUni platform
//!
//! This library pairs newcomer students with veteran mentors from the same
//! course, scoring candidates on course, gender, age proximity and interest
//! similarity, and keeps the persisted match table consistent across runs.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{CompatibilityEvaluator, MatchOutcome, Matcher};
pub use models::{Candidate, CompatibilityWeights, MatchedPair, UserRole};
pub use services::{MatchReconciler, PostgresClient, SimilarityClient};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Verify that the library exports work correctly
        let weights = CompatibilityWeights::default();
        assert_eq!(weights.max_score(), 100.0);
    }
}
