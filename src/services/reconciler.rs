use crate::core::round2;
use crate::models::MatchedPair;
use crate::services::notify::MatchNotification;
use crate::services::postgres::{PostgresClient, PostgresError};
use sqlx::{Acquire, Postgres, Row, Transaction};
use std::sync::Arc;

/// Counters from applying one assignment to the match table
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    pub created: usize,
    pub updated: usize,
    pub deactivated: usize,
    /// Pairs dropped on a unique-constraint conflict; the persisted state is
    /// kept as the source of truth for those
    pub skipped: usize,
    pub average_score: f64,
    /// Post-commit notification hook: contacts of the pairs that were applied.
    /// Deliberately separate from the transaction so callers (and tests) can
    /// observe the commit independently of notification delivery.
    pub to_notify: Vec<MatchNotification>,
}

enum RowChange {
    Created,
    Updated,
}

struct PairResult {
    change: RowChange,
    deactivated: usize,
}

/// Applies a freshly computed assignment to the persisted match table
///
/// The whole assignment is written in one transaction: per pair, a superseded
/// veteran-side row is deactivated, then the newcomer-side row is created,
/// score-updated, or re-pointed to the new veteran. A unique-constraint
/// conflict skips that pair (savepoint rollback) and the run continues; any
/// other storage error rolls back everything.
///
/// Runs are serialized through an internal lock: two concurrent reconciliations
/// over overlapping populations could otherwise both pass the "is there an
/// active row" checks and break the 1:1 invariant.
pub struct MatchReconciler {
    postgres: Arc<PostgresClient>,
    run_lock: tokio::sync::Mutex<()>,
}

impl MatchReconciler {
    pub fn new(postgres: Arc<PostgresClient>) -> Self {
        Self {
            postgres,
            run_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Reconcile an assignment against the currently active matches
    pub async fn reconcile(
        &self,
        pairs: &[MatchedPair],
    ) -> Result<ReconcileOutcome, PostgresError> {
        let _guard = self.run_lock.lock().await;

        let mut outcome = ReconcileOutcome::default();
        if pairs.is_empty() {
            return Ok(outcome);
        }

        let mut tx = self.postgres.pool().begin().await?;
        let mut applied_score_sum = 0.0;

        for pair in pairs {
            // Savepoint per pair so a conflict only discards this row
            let mut sp = tx.begin().await?;
            match reconcile_pair(&mut sp, pair).await {
                Ok(result) => {
                    sp.commit().await?;
                    outcome.deactivated += result.deactivated;
                    match result.change {
                        RowChange::Created => outcome.created += 1,
                        RowChange::Updated => outcome.updated += 1,
                    }
                    outcome.to_notify.push(MatchNotification::from_pair(pair));
                    applied_score_sum += pair.score;
                }
                Err(e) if is_unique_violation(&e) => {
                    sp.rollback().await?;
                    outcome.skipped += 1;
                    tracing::warn!(
                        "Skipping pair ({}, {}) on unique-constraint conflict: {}",
                        pair.newcomer.id,
                        pair.veteran.id,
                        e
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        tx.commit().await?;

        // Skipped pairs were not applied, so they do not weigh on the average
        let applied = outcome.created + outcome.updated;
        if applied > 0 {
            outcome.average_score = round2(applied_score_sum / applied as f64);
        }

        tracing::info!(
            "Reconciliation committed: {} created, {} updated, {} deactivated, {} skipped",
            outcome.created,
            outcome.updated,
            outcome.deactivated,
            outcome.skipped
        );

        Ok(outcome)
    }
}

async fn reconcile_pair(
    tx: &mut Transaction<'_, Postgres>,
    pair: &MatchedPair,
) -> Result<PairResult, sqlx::Error> {
    let veteran_id = pair.veteran.id;
    let newcomer_id = pair.newcomer.id;
    let mut deactivated = 0;

    // Veteran side: an active row pointing at a different newcomer is
    // superseded by this assignment
    let existing_veteran_row = sqlx::query(
        "SELECT id, newcomer_id FROM mentor_matches WHERE veteran_id = $1 AND status = 'active'",
    )
    .bind(veteran_id)
    .fetch_optional(&mut **tx)
    .await?;

    if let Some(row) = existing_veteran_row {
        let current_newcomer: i64 = row.get("newcomer_id");
        if current_newcomer != newcomer_id {
            let old_id: i64 = row.get("id");
            sqlx::query(
                "UPDATE mentor_matches SET status = 'deactivated', updated_at = NOW() WHERE id = $1",
            )
            .bind(old_id)
            .execute(&mut **tx)
            .await?;
            deactivated += 1;
            tracing::debug!(
                "Deactivated match {} (veteran {} now pairs with newcomer {})",
                old_id,
                veteran_id,
                newcomer_id
            );
        }
    }

    // Newcomer side: create, refresh the score, or re-point to the new
    // veteran while keeping the row's identity
    let existing_newcomer_row = sqlx::query(
        "SELECT id, veteran_id FROM mentor_matches WHERE newcomer_id = $1 AND status = 'active'",
    )
    .bind(newcomer_id)
    .fetch_optional(&mut **tx)
    .await?;

    let change = match existing_newcomer_row {
        None => {
            sqlx::query(
                r#"
                INSERT INTO mentor_matches (veteran_id, newcomer_id, status, score)
                VALUES ($1, $2, 'active', $3)
            "#,
            )
            .bind(veteran_id)
            .bind(newcomer_id)
            .bind(pair.score)
            .execute(&mut **tx)
            .await?;
            RowChange::Created
        }
        Some(row) => {
            let row_id: i64 = row.get("id");
            let current_veteran: i64 = row.get("veteran_id");
            if current_veteran == veteran_id {
                sqlx::query(
                    "UPDATE mentor_matches SET score = $2, updated_at = NOW() WHERE id = $1",
                )
                .bind(row_id)
                .bind(pair.score)
                .execute(&mut **tx)
                .await?;
            } else {
                sqlx::query(
                    r#"
                    UPDATE mentor_matches
                    SET veteran_id = $2, score = $3, updated_at = NOW()
                    WHERE id = $1
                "#,
                )
                .bind(row_id)
                .bind(veteran_id)
                .bind(pair.score)
                .execute(&mut **tx)
                .await?;
            }
            RowChange::Updated
        }
    };

    // The newcomer is no longer waiting for a mentor
    sqlx::query("UPDATE users SET match_status = 'paired', updated_at = NOW() WHERE id = $1")
        .bind(newcomer_id)
        .execute(&mut **tx)
        .await?;

    Ok(PairResult {
        change,
        deactivated,
    })
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_detection_ignores_other_errors() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(!is_unique_violation(&sqlx::Error::PoolClosed));
    }
}
