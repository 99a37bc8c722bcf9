use serde::{Deserialize, Serialize};

/// Which side of the pairing a user belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum UserRole {
    Newcomer,
    Veteran,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Newcomer => "newcomer",
            UserRole::Veteran => "veteran",
        }
    }
}

/// Lifecycle status of a persisted match
///
/// Matches are never physically deleted: cancellation and supersession are
/// status transitions, keeping the full pairing history in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "match_status", rename_all = "lowercase")]
pub enum MatchStatus {
    Active,
    Cancelled,
    Deactivated,
}

/// A user eligible for one matching run
///
/// Materialized from the user directory per run and immutable for its
/// duration. `birth_year` is kept raw; ages are derived against the run's
/// reference year so results do not drift mid-run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub course: Option<String>,
    pub gender: Option<String>,
    #[serde(rename = "birthYear")]
    pub birth_year: i32,
    #[serde(rename = "entryYear")]
    pub entry_year: Option<i32>,
    #[serde(default)]
    pub interests: Option<String>,
}

impl Candidate {
    /// Interests text with surrounding whitespace stripped, empty when unset
    pub fn interests_text(&self) -> &str {
        self.interests.as_deref().map(str::trim).unwrap_or("")
    }
}

/// Per-factor breakdown of one compatibility evaluation
///
/// The four factors are fixed fields rather than a loose score bag so each
/// one can be asserted on in isolation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FactorBreakdown {
    #[serde(rename = "sameCourse")]
    pub same_course: bool,
    #[serde(rename = "sameGender")]
    pub same_gender: bool,
    #[serde(rename = "sameAge")]
    pub same_age: bool,
    /// Semantic similarity of the interest texts, in [0, 1]
    #[serde(rename = "interestsSimilarity")]
    pub interests_similarity: f64,
}

/// One accepted pairing produced by the matcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedPair {
    pub newcomer: Candidate,
    pub veteran: Candidate,
    pub score: f64,
    pub details: FactorBreakdown,
    #[serde(rename = "ageDifference")]
    pub age_difference: u32,
}

/// Point budget per compatibility factor
///
/// The course weight only contributes when the gate passes; a course mismatch
/// short-circuits to incompatible regardless of the other factors.
#[derive(Debug, Clone, Copy)]
pub struct CompatibilityWeights {
    pub course: f64,
    pub gender: f64,
    pub age: f64,
    pub interests: f64,
}

impl CompatibilityWeights {
    /// Highest score a pair can reach with every factor maxed out
    pub fn max_score(&self) -> f64 {
        self.course + self.gender + self.age + self.interests
    }
}

impl Default for CompatibilityWeights {
    fn default() -> Self {
        Self {
            course: 50.0,
            gender: 20.0,
            age: 15.0,
            interests: 15.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_budget() {
        let weights = CompatibilityWeights::default();
        assert_eq!(weights.course, 50.0);
        assert_eq!(weights.gender, 20.0);
        assert_eq!(weights.age, 15.0);
        assert_eq!(weights.interests, 15.0);
        assert_eq!(weights.max_score(), 100.0);
    }

    #[test]
    fn test_interests_text_trims() {
        let candidate = Candidate {
            id: 1,
            name: "Test".to_string(),
            email: "test@paduni.com".to_string(),
            role: UserRole::Newcomer,
            course: Some("CS".to_string()),
            gender: Some("M".to_string()),
            birth_year: 2005,
            entry_year: Some(2024),
            interests: Some("  AI, robotics  ".to_string()),
        };

        assert_eq!(candidate.interests_text(), "AI, robotics");
    }

    #[test]
    fn test_interests_text_empty_when_unset() {
        let candidate = Candidate {
            id: 2,
            name: "Test".to_string(),
            email: "test@paduni.com".to_string(),
            role: UserRole::Veteran,
            course: None,
            gender: None,
            birth_year: 2000,
            entry_year: None,
            interests: None,
        };

        assert_eq!(candidate.interests_text(), "");
    }
}
