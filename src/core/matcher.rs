use crate::core::compatibility::{round2, CompatibilityEvaluator};
use crate::core::similarity::InterestScorer;
use crate::models::{Candidate, MatchedPair};
use std::collections::HashSet;

/// Result of one matching run over two populations
#[derive(Debug, Default)]
pub struct MatchOutcome {
    /// Accepted 1:1 pairings, in descending score order
    pub pairs: Vec<MatchedPair>,
    pub total_newcomers: usize,
    pub total_veterans: usize,
    /// Pairs evaluated (full cartesian product)
    pub comparisons: usize,
    /// Pairs that passed the course gate before greedy selection
    pub compatible_pairs: usize,
    /// Evaluations where the similarity backend failed and the interest
    /// factor degraded to zero
    pub scoring_errors: usize,
}

impl MatchOutcome {
    /// Mean score of the accepted pairs, rounded to 2 decimals; 0 when empty
    pub fn average_score(&self) -> f64 {
        if self.pairs.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.pairs.iter().map(|p| p.score).sum();
        round2(sum / self.pairs.len() as f64)
    }
}

/// Greedy bipartite matcher between newcomers and veterans
///
/// Evaluates every (newcomer, veteran) pair, keeps the compatible ones, sorts
/// by score descending and walks the list greedily so that no participant is
/// used twice. This is a greedy approximation, not an optimal max-weight
/// assignment; it can differ from the Hungarian algorithm on adversarial
/// score sets but is kept for predictability on cohort-sized inputs.
#[derive(Debug, Clone)]
pub struct Matcher<S> {
    evaluator: CompatibilityEvaluator<S>,
}

impl<S: InterestScorer> Matcher<S> {
    pub fn new(evaluator: CompatibilityEvaluator<S>) -> Self {
        Self { evaluator }
    }

    pub fn evaluator(&self) -> &CompatibilityEvaluator<S> {
        &self.evaluator
    }

    /// Pair each newcomer with at most one veteran (and vice versa)
    ///
    /// An empty population on either side short-circuits to an empty outcome;
    /// that is a normal result, not an error.
    pub async fn pair(&self, newcomers: &[Candidate], veterans: &[Candidate]) -> MatchOutcome {
        let mut outcome = MatchOutcome {
            total_newcomers: newcomers.len(),
            total_veterans: veterans.len(),
            ..Default::default()
        };

        if newcomers.is_empty() || veterans.is_empty() {
            return outcome;
        }

        // O(N*M) evaluation over the cartesian product. Sequential on purpose:
        // populations are cohort-sized and the backend call is the only I/O.
        let mut candidates: Vec<MatchedPair> = Vec::new();
        for newcomer in newcomers {
            for veteran in veterans {
                let compatibility = self.evaluator.evaluate(newcomer, veteran).await;
                outcome.comparisons += 1;
                if compatibility.scoring_degraded {
                    outcome.scoring_errors += 1;
                }

                if compatibility.compatible {
                    candidates.push(MatchedPair {
                        newcomer: newcomer.clone(),
                        veteran: veteran.clone(),
                        score: compatibility.score,
                        details: compatibility.details,
                        age_difference: compatibility.age_difference,
                    });
                }
            }
        }

        outcome.compatible_pairs = candidates.len();

        // Score descending; equal scores resolve by lower newcomer id, then
        // lower veteran id, so reruns over the same data pick the same pairs
        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.newcomer.id.cmp(&b.newcomer.id))
                .then_with(|| a.veteran.id.cmp(&b.veteran.id))
        });

        // Greedy 1:1 selection: first unconsumed pair wins
        let mut used_newcomers: HashSet<i64> = HashSet::new();
        let mut used_veterans: HashSet<i64> = HashSet::new();

        for pair in candidates {
            if used_newcomers.contains(&pair.newcomer.id)
                || used_veterans.contains(&pair.veteran.id)
            {
                continue;
            }

            used_newcomers.insert(pair.newcomer.id);
            used_veterans.insert(pair.veteran.id);

            tracing::debug!(
                "Paired newcomer {} with veteran {} (score: {:.2})",
                pair.newcomer.id,
                pair.veteran.id,
                pair.score
            );

            outcome.pairs.push(pair);
        }

        tracing::info!(
            "Matching run: {} comparisons, {} compatible pairs, {} accepted, {} scoring errors",
            outcome.comparisons,
            outcome.compatible_pairs,
            outcome.pairs.len(),
            outcome.scoring_errors
        );

        outcome
    }
}
