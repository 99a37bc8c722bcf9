use crate::core::similarity::InterestScorer;
use crate::models::{Candidate, CompatibilityWeights, FactorBreakdown};
use chrono::Datelike;

/// Outcome of evaluating one (newcomer, veteran) pair
#[derive(Debug, Clone)]
pub struct Compatibility {
    /// Sum of contributed factor weights, rounded to 2 decimal places
    pub score: f64,
    /// True whenever the course gate passed, regardless of the other factors
    pub compatible: bool,
    pub details: FactorBreakdown,
    /// Absolute age difference in years, used for tie-break analysis
    pub age_difference: u32,
    /// True when the similarity backend failed and the interest factor
    /// degraded to zero instead of aborting the run
    pub scoring_degraded: bool,
}

/// Computes the weighted multi-factor compatibility score for a pair
///
/// Factor budget (additive, max 100 with default weights):
/// 1. Course gate (50) — normalized equality; a mismatch is a hard fail
/// 2. Gender (20) — case-insensitive equality
/// 3. Age proximity (15) — full weight at |diff| <= 1, half at |diff| == 2
/// 4. Interests (15) — semantic similarity in [0, 1] scaled by the weight
#[derive(Debug, Clone)]
pub struct CompatibilityEvaluator<S> {
    scorer: S,
    weights: CompatibilityWeights,
    reference_year: i32,
}

impl<S: InterestScorer> CompatibilityEvaluator<S> {
    pub fn new(scorer: S, weights: CompatibilityWeights) -> Self {
        Self {
            scorer,
            weights,
            reference_year: chrono::Utc::now().year(),
        }
    }

    /// Pin the year ages are derived from, so a run started near midnight on
    /// New Year's Eve scores consistently (and tests are deterministic)
    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = year;
        self
    }

    pub fn weights(&self) -> &CompatibilityWeights {
        &self.weights
    }

    /// Evaluate compatibility between a newcomer and a veteran
    pub async fn evaluate(&self, newcomer: &Candidate, veteran: &Candidate) -> Compatibility {
        let mut details = FactorBreakdown::default();
        let age_difference = self.age_difference(newcomer, veteran);

        // 1. Course gate: without a shared course the pair is out, no matter
        // how well the other factors line up
        if !same_course(newcomer, veteran) {
            return Compatibility {
                score: 0.0,
                compatible: false,
                details,
                age_difference,
                scoring_degraded: false,
            };
        }

        details.same_course = true;
        let mut total = self.weights.course;

        // 2. Gender
        if same_gender(newcomer, veteran) {
            details.same_gender = true;
            total += self.weights.gender;
        }

        // 3. Age proximity, graded
        if age_difference <= 1 {
            details.same_age = true;
            total += self.weights.age;
        } else if age_difference == 2 {
            total += self.weights.age / 2.0;
        }

        // 4. Interests via the similarity backend
        let (similarity, scoring_degraded) = self.interest_similarity(newcomer, veteran).await;
        details.interests_similarity = similarity;
        total += similarity * self.weights.interests;

        Compatibility {
            score: round2(total),
            compatible: true,
            details,
            age_difference,
            scoring_degraded,
        }
    }

    fn age_difference(&self, a: &Candidate, b: &Candidate) -> u32 {
        let age_a = self.reference_year - a.birth_year;
        let age_b = self.reference_year - b.birth_year;
        (age_a - age_b).unsigned_abs()
    }

    /// Interest similarity in [0, 1]; the second value flags a degraded
    /// (backend-failed) result
    async fn interest_similarity(&self, newcomer: &Candidate, veteran: &Candidate) -> (f64, bool) {
        let text_a = newcomer.interests_text();
        let text_b = veteran.interests_text();

        if text_a.is_empty() || text_b.is_empty() {
            return (0.0, false);
        }

        match self.scorer.score(text_a, text_b).await {
            Ok(similarity) => (similarity.clamp(0.0, 1.0), false),
            Err(e) => {
                tracing::warn!(
                    "Interest scoring failed for pair ({}, {}), degrading factor to 0: {}",
                    newcomer.id,
                    veteran.id,
                    e
                );
                (0.0, true)
            }
        }
    }
}

fn same_course(a: &Candidate, b: &Candidate) -> bool {
    match (&a.course, &b.course) {
        (Some(course_a), Some(course_b)) => {
            normalize_course(course_a) == normalize_course(course_b)
        }
        _ => false,
    }
}

fn same_gender(a: &Candidate, b: &Candidate) -> bool {
    match (&a.gender, &b.gender) {
        (Some(gender_a), Some(gender_b)) => {
            gender_a.to_lowercase() == gender_b.to_lowercase()
        }
        _ => false,
    }
}

#[inline]
fn normalize_course(course: &str) -> String {
    course.trim().to_lowercase()
}

/// Round a score to 2 decimal places
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
