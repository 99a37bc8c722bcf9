// Core algorithm exports
pub mod compatibility;
pub mod matcher;
pub mod similarity;

pub use compatibility::{round2, Compatibility, CompatibilityEvaluator};
pub use matcher::{MatchOutcome, Matcher};
pub use similarity::{cosine_similarity, round_similarity, InterestScorer, ScoringError};
