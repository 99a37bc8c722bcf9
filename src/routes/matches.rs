use crate::core::Matcher;
use crate::models::{
    CancelMatchRequest, CancelMatchResponse, CreatedMatch, ErrorResponse, HealthResponse,
    ListMatchesQuery, ListMatchesResponse, MatchAvailabilityResponse, MatchRunStats, Pagination,
    ParticipantInfo, RunMatchesResponse, UserMatchResponse,
};
use crate::services::{
    MatchReconciler, NotificationClient, PostgresClient, PostgresError, SimilarityClient,
};
use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<PostgresClient>,
    pub matcher: Arc<Matcher<SimilarityClient>>,
    pub reconciler: Arc<MatchReconciler>,
    pub notifier: Arc<NotificationClient>,
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/matches/automatic", web::post().to(run_automatic_match))
        .route("/matches/list", web::get().to(list_matches))
        .route("/matches/status", web::get().to(match_status))
        .route("/matches/user/{user_id}", web::get().to(get_user_match))
        .route("/matches/{match_id}/cancel", web::post().to(cancel_match));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = state.postgres.health_check().await.unwrap_or(false);
    let status = if pg_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Execute the automatic matching run
///
/// POST /api/v1/matches/automatic
///
/// Fetches both available populations, computes the greedy 1:1 assignment,
/// reconciles it against the match table and queues notifications. An empty
/// population or an empty assignment is a successful run with zero results,
/// not an error.
async fn run_automatic_match(state: web::Data<AppState>) -> impl Responder {
    let newcomers = match state.postgres.list_pending_newcomers().await {
        Ok(list) => list,
        Err(e) => return storage_error("Failed to fetch newcomers", e),
    };
    let veterans = match state.postgres.list_available_veterans().await {
        Ok(list) => list,
        Err(e) => return storage_error("Failed to fetch veterans", e),
    };

    tracing::info!(
        "Starting matching run: {} newcomers, {} veterans",
        newcomers.len(),
        veterans.len()
    );

    if newcomers.is_empty() || veterans.is_empty() {
        let side = if newcomers.is_empty() { "newcomers" } else { "veterans" };
        return HttpResponse::Ok().json(RunMatchesResponse {
            success: true,
            message: format!("No {} available for matching", side),
            matches: vec![],
            statistics: MatchRunStats {
                total_newcomers: newcomers.len(),
                total_veterans: veterans.len(),
                ..Default::default()
            },
        });
    }

    let outcome = state.matcher.pair(&newcomers, &veterans).await;

    if outcome.pairs.is_empty() {
        return HttpResponse::Ok().json(RunMatchesResponse {
            success: true,
            message: "No compatible pairs found".to_string(),
            matches: vec![],
            statistics: MatchRunStats {
                total_newcomers: outcome.total_newcomers,
                total_veterans: outcome.total_veterans,
                comparisons: outcome.comparisons,
                scoring_errors: outcome.scoring_errors,
                ..Default::default()
            },
        });
    }

    let reconciled = match state.reconciler.reconcile(&outcome.pairs).await {
        Ok(result) => result,
        Err(e) => return storage_error("Failed to persist matches", e),
    };

    // Critical-action audit entry for the run
    tracing::info!(
        action = "AUTOMATIC_MATCH_EXECUTION",
        created = reconciled.created,
        updated = reconciled.updated,
        deactivated = reconciled.deactivated,
        skipped = reconciled.skipped,
        average_score = reconciled.average_score,
        "Automatic matching run committed"
    );

    // Post-commit hook: delivery is fire-and-forget and never fails the run
    let notifier = state.notifier.clone();
    let to_notify = reconciled.to_notify.clone();
    tokio::spawn(async move {
        notifier.notify_all(&to_notify).await;
    });

    let matches = applied_matches(&outcome.pairs, &reconciled.to_notify);

    let statistics = MatchRunStats {
        total_newcomers: outcome.total_newcomers,
        total_veterans: outcome.total_veterans,
        comparisons: outcome.comparisons,
        compatible_pairs: outcome.compatible_pairs,
        matches_created: reconciled.created,
        matches_updated: reconciled.updated,
        matches_deactivated: reconciled.deactivated,
        matches_skipped: reconciled.skipped,
        scoring_errors: outcome.scoring_errors,
        average_score: reconciled.average_score,
    };

    HttpResponse::Ok().json(RunMatchesResponse {
        success: true,
        message: format!(
            "Matching run complete: {} pairs applied",
            reconciled.created + reconciled.updated
        ),
        matches,
        statistics,
    })
}

/// Paginated match listing
///
/// GET /api/v1/matches/list?limit=&offset=&minScore=&userId=
async fn list_matches(
    state: web::Data<AppState>,
    query: web::Query<ListMatchesQuery>,
) -> impl Responder {
    let filters = query.normalized();

    let matches = match state
        .postgres
        .list_matches(filters.min_score, filters.limit, filters.offset, filters.user_id)
        .await
    {
        Ok(matches) => matches,
        Err(e) => return storage_error("Failed to fetch matches", e),
    };

    let total = match state
        .postgres
        .count_matches(filters.min_score, filters.user_id)
        .await
    {
        Ok(total) => total,
        Err(e) => return storage_error("Failed to count matches", e),
    };

    HttpResponse::Ok().json(ListMatchesResponse {
        success: true,
        matches,
        pagination: Pagination {
            total,
            limit: filters.limit,
            offset: filters.offset,
            has_more: filters.offset + filters.limit < total,
        },
    })
}

/// Availability counts for both populations
///
/// GET /api/v1/matches/status
async fn match_status(state: web::Data<AppState>) -> impl Responder {
    let newcomers = match state.postgres.list_pending_newcomers().await {
        Ok(list) => list,
        Err(e) => return storage_error("Failed to fetch newcomers", e),
    };
    let veterans = match state.postgres.list_available_veterans().await {
        Ok(list) => list,
        Err(e) => return storage_error("Failed to fetch veterans", e),
    };

    HttpResponse::Ok().json(MatchAvailabilityResponse {
        success: true,
        available_newcomers: newcomers.len(),
        available_veterans: veterans.len(),
        can_run_matching: !newcomers.is_empty() && !veterans.is_empty(),
    })
}

/// The active match of one user
///
/// GET /api/v1/matches/user/{user_id}
async fn get_user_match(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> impl Responder {
    let user_id = path.into_inner();

    match state.postgres.get_user_match(user_id).await {
        Ok(Some(view)) => HttpResponse::Ok().json(UserMatchResponse {
            success: true,
            has_match: true,
            data: Some(view),
        }),
        Ok(None) => HttpResponse::NotFound().json(UserMatchResponse {
            success: false,
            has_match: false,
            data: None,
        }),
        Err(e) => storage_error("Failed to fetch user match", e),
    }
}

/// Request cancellation of an active match
///
/// POST /api/v1/matches/{match_id}/cancel
///
/// Request body:
/// ```json
/// { "justification": "string" }
/// ```
async fn cancel_match(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    req: web::Json<CancelMatchRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let match_id = path.into_inner();

    match state.postgres.cancel_match(match_id, &req.justification).await {
        Ok(()) => HttpResponse::Ok().json(CancelMatchResponse {
            success: true,
            message: "Match cancellation recorded".to_string(),
            match_id,
        }),
        Err(PostgresError::NotFound(message)) => HttpResponse::NotFound().json(ErrorResponse {
            error: "Match not found".to_string(),
            message,
            status_code: 404,
        }),
        Err(PostgresError::InvalidInput(message)) => {
            HttpResponse::BadRequest().json(ErrorResponse {
                error: "Invalid request".to_string(),
                message,
                status_code: 400,
            })
        }
        Err(e) => storage_error("Failed to cancel match", e),
    }
}

/// Pairings actually applied by the reconciliation, in run order
///
/// Pairs skipped on a storage conflict stay out of the response even though
/// the matcher proposed them.
fn applied_matches(
    pairs: &[crate::models::MatchedPair],
    applied: &[crate::services::MatchNotification],
) -> Vec<CreatedMatch> {
    let applied_ids: std::collections::HashSet<(i64, i64)> = applied
        .iter()
        .map(|n| (n.newcomer_id, n.veteran_id))
        .collect();

    pairs
        .iter()
        .filter(|pair| applied_ids.contains(&(pair.newcomer.id, pair.veteran.id)))
        .map(|pair| CreatedMatch {
            newcomer: ParticipantInfo {
                id: pair.newcomer.id,
                name: pair.newcomer.name.clone(),
                email: Some(pair.newcomer.email.clone()),
            },
            veteran: ParticipantInfo {
                id: pair.veteran.id,
                name: pair.veteran.name.clone(),
                email: Some(pair.veteran.email.clone()),
            },
            score: pair.score,
        })
        .collect()
}

fn storage_error(context: &str, error: PostgresError) -> HttpResponse {
    tracing::error!("{}: {}", context, error);
    HttpResponse::InternalServerError().json(ErrorResponse {
        error: context.to_string(),
        message: error.to_string(),
        status_code: 500,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Candidate, FactorBreakdown, MatchedPair, UserRole};
    use crate::services::MatchNotification;

    fn pair(newcomer_id: i64, veteran_id: i64, score: f64) -> MatchedPair {
        let candidate = |id: i64, role: UserRole| Candidate {
            id,
            name: format!("User {}", id),
            email: format!("user{}@paduni.com", id),
            role,
            course: Some("CS".to_string()),
            gender: Some("F".to_string()),
            birth_year: 2005,
            entry_year: None,
            interests: None,
        };

        MatchedPair {
            newcomer: candidate(newcomer_id, UserRole::Newcomer),
            veteran: candidate(veteran_id, UserRole::Veteran),
            score,
            details: FactorBreakdown::default(),
            age_difference: 0,
        }
    }

    #[test]
    fn test_applied_matches_excludes_skipped_pairs() {
        let pairs = vec![pair(1, 10, 92.5), pair(2, 11, 85.0), pair(3, 12, 70.0)];
        // The middle pair was skipped during reconciliation
        let applied = vec![
            MatchNotification::from_pair(&pairs[0]),
            MatchNotification::from_pair(&pairs[2]),
        ];

        let matches = applied_matches(&pairs, &applied);

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].newcomer.id, 1);
        assert_eq!(matches[1].newcomer.id, 3);
    }

    #[test]
    fn test_applied_matches_empty_when_nothing_applied() {
        let pairs = vec![pair(1, 10, 92.5)];
        assert!(applied_matches(&pairs, &[]).is_empty());
    }

    #[test]
    fn test_health_check_response() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
            timestamp: chrono::Utc::now(),
        };

        assert_eq!(response.status, "healthy");
    }

    #[test]
    fn test_pagination_has_more() {
        let pagination = Pagination {
            total: 25,
            limit: 10,
            offset: 10,
            has_more: 10 + 10 < 25,
        };

        assert!(pagination.has_more);
    }
}
