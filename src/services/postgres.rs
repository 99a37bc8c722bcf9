use crate::models::{Candidate, MatchStatus, ParticipantInfo, UserRole};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// One row of the match listing, with participant identities joined in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSummary {
    pub id: i64,
    pub veteran: ParticipantInfo,
    pub newcomer: ParticipantInfo,
    pub score: Option<f64>,
    pub status: MatchStatus,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// The active match of one user, seen from their side of the pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMatchView {
    #[serde(rename = "matchId")]
    pub match_id: i64,
    pub score: Option<f64>,
    pub status: MatchStatus,
    #[serde(rename = "matchedAt")]
    pub matched_at: chrono::DateTime<chrono::Utc>,
    pub counterpart: CounterpartProfile,
}

/// Public profile fields of the other participant in a match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterpartProfile {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub course: Option<String>,
    #[serde(rename = "entryYear")]
    pub entry_year: Option<i32>,
    pub interests: Option<String>,
    pub role: UserRole,
}

/// PostgreSQL client for the user directory and the match table
///
/// Owns every read-side query (listing, counting, per-user lookup) and the
/// cancellation workflow. Reconciliation writes go through
/// [`crate::services::MatchReconciler`], which borrows the pool from here.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
    ) -> Result<Self, PostgresError> {
        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
        )
        .await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Newcomers waiting for a mentor: pending status and no active match
    pub async fn list_pending_newcomers(&self) -> Result<Vec<Candidate>, PostgresError> {
        let query = r#"
            SELECT id, name, email, role, course, gender, birth_year, entry_year, interests
            FROM users
            WHERE role = 'newcomer'
              AND match_status = 'pending'
              AND id NOT IN (
                  SELECT newcomer_id FROM mentor_matches WHERE status = 'active'
              )
            ORDER BY created_at ASC
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;
        let candidates = rows.iter().map(candidate_from_row).collect();

        Ok(candidates)
    }

    /// Veterans free to mentor: no active match on their side of the table
    pub async fn list_available_veterans(&self) -> Result<Vec<Candidate>, PostgresError> {
        let query = r#"
            SELECT id, name, email, role, course, gender, birth_year, entry_year, interests
            FROM users
            WHERE role = 'veteran'
              AND id NOT IN (
                  SELECT veteran_id FROM mentor_matches WHERE status = 'active'
              )
            ORDER BY created_at ASC
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;
        let candidates = rows.iter().map(candidate_from_row).collect();

        Ok(candidates)
    }

    /// Paginated match listing, ordered by score then recency descending
    pub async fn list_matches(
        &self,
        min_score: f64,
        limit: i64,
        offset: i64,
        user_id: Option<i64>,
    ) -> Result<Vec<MatchSummary>, PostgresError> {
        let mut query = String::from(
            r#"
            SELECT
                m.id, m.veteran_id, m.newcomer_id, m.score, m.status, m.created_at,
                v.name AS veteran_name, v.email AS veteran_email,
                n.name AS newcomer_name, n.email AS newcomer_email
            FROM mentor_matches m
            LEFT JOIN users v ON m.veteran_id = v.id
            LEFT JOIN users n ON m.newcomer_id = n.id
            WHERE m.score IS NOT NULL AND m.score >= $1
        "#,
        );

        if user_id.is_some() {
            query.push_str(" AND (m.veteran_id = $4 OR m.newcomer_id = $4)");
        }
        query.push_str(" ORDER BY m.score DESC, m.created_at DESC LIMIT $2 OFFSET $3");

        let mut q = sqlx::query(&query).bind(min_score).bind(limit).bind(offset);
        if let Some(id) = user_id {
            q = q.bind(id);
        }

        let rows = q.fetch_all(&self.pool).await?;

        let summaries = rows
            .iter()
            .map(|row| MatchSummary {
                id: row.get("id"),
                veteran: ParticipantInfo {
                    id: row.get("veteran_id"),
                    name: display_name(row.get("veteran_name")),
                    email: row.get("veteran_email"),
                },
                newcomer: ParticipantInfo {
                    id: row.get("newcomer_id"),
                    name: display_name(row.get("newcomer_name")),
                    email: row.get("newcomer_email"),
                },
                score: row.get("score"),
                status: row.get("status"),
                created_at: row.get("created_at"),
            })
            .collect();

        Ok(summaries)
    }

    /// Total rows the listing filters would return, for pagination
    pub async fn count_matches(
        &self,
        min_score: f64,
        user_id: Option<i64>,
    ) -> Result<i64, PostgresError> {
        let mut query = String::from(
            "SELECT COUNT(*) AS total FROM mentor_matches WHERE score IS NOT NULL AND score >= $1",
        );
        if user_id.is_some() {
            query.push_str(" AND (veteran_id = $2 OR newcomer_id = $2)");
        }

        let mut q = sqlx::query(&query).bind(min_score);
        if let Some(id) = user_id {
            q = q.bind(id);
        }

        let row = q.fetch_one(&self.pool).await?;
        Ok(row.get("total"))
    }

    /// The single active match a user participates in, with the counterpart's
    /// public profile; `None` when the user has no active match
    pub async fn get_user_match(
        &self,
        user_id: i64,
    ) -> Result<Option<UserMatchView>, PostgresError> {
        let query = r#"
            SELECT
                m.id AS match_id, m.veteran_id, m.newcomer_id, m.score, m.status, m.updated_at,
                v.name AS veteran_name, v.email AS veteran_email, v.course AS veteran_course,
                v.entry_year AS veteran_entry_year, v.interests AS veteran_interests,
                n.name AS newcomer_name, n.email AS newcomer_email, n.course AS newcomer_course,
                n.entry_year AS newcomer_entry_year, n.interests AS newcomer_interests
            FROM mentor_matches m
            LEFT JOIN users v ON m.veteran_id = v.id
            LEFT JOIN users n ON m.newcomer_id = n.id
            WHERE (m.veteran_id = $1 OR m.newcomer_id = $1)
              AND m.status = 'active'
            ORDER BY m.updated_at DESC
            LIMIT 1
        "#;

        let row = match sqlx::query(query).bind(user_id).fetch_optional(&self.pool).await? {
            Some(row) => row,
            None => return Ok(None),
        };

        // Whichever side the subject holds, the counterpart is the other one
        let veteran_id: i64 = row.get("veteran_id");
        let counterpart = if veteran_id == user_id {
            CounterpartProfile {
                id: row.get("newcomer_id"),
                name: display_name(row.get("newcomer_name")),
                email: row.get("newcomer_email"),
                course: row.get("newcomer_course"),
                entry_year: row.get("newcomer_entry_year"),
                interests: row.get("newcomer_interests"),
                role: UserRole::Newcomer,
            }
        } else {
            CounterpartProfile {
                id: veteran_id,
                name: display_name(row.get("veteran_name")),
                email: row.get("veteran_email"),
                course: row.get("veteran_course"),
                entry_year: row.get("veteran_entry_year"),
                interests: row.get("veteran_interests"),
                role: UserRole::Veteran,
            }
        };

        Ok(Some(UserMatchView {
            match_id: row.get("match_id"),
            score: row.get("score"),
            status: row.get("status"),
            matched_at: row.get("updated_at"),
            counterpart,
        }))
    }

    /// Cancel an active match with a mandatory justification
    ///
    /// The row transitions to `cancelled` and stays in the table; cancellation
    /// never deletes history.
    pub async fn cancel_match(
        &self,
        match_id: i64,
        justification: &str,
    ) -> Result<(), PostgresError> {
        let justification = justification.trim();
        if justification.is_empty() {
            return Err(PostgresError::InvalidInput(
                "justification is required".to_string(),
            ));
        }

        let row = sqlx::query("SELECT status FROM mentor_matches WHERE id = $1")
            .bind(match_id)
            .fetch_optional(&self.pool)
            .await?;

        let status: MatchStatus = match row {
            Some(row) => row.get("status"),
            None => {
                return Err(PostgresError::NotFound(format!(
                    "match {} does not exist",
                    match_id
                )))
            }
        };

        if status != MatchStatus::Active {
            return Err(PostgresError::InvalidInput(format!(
                "match {} is not active",
                match_id
            )));
        }

        sqlx::query(
            r#"
            UPDATE mentor_matches
            SET status = 'cancelled',
                cancellation_reason = $2,
                updated_at = NOW()
            WHERE id = $1
        "#,
        )
        .bind(match_id)
        .bind(justification)
        .execute(&self.pool)
        .await?;

        tracing::info!("Match {} cancelled: {}", match_id, justification);
        Ok(())
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn candidate_from_row(row: &sqlx::postgres::PgRow) -> Candidate {
    Candidate {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        role: row.get("role"),
        course: row.get("course"),
        gender: row.get("gender"),
        birth_year: row.get("birth_year"),
        entry_year: row.get("entry_year"),
        interests: row.get("interests"),
    }
}

/// Joined participants may have been removed from the directory
fn display_name(name: Option<String>) -> String {
    name.unwrap_or_else(|| "Removed user".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_fallback() {
        assert_eq!(display_name(Some("Ana".to_string())), "Ana");
        assert_eq!(display_name(None), "Removed user");
    }
}
