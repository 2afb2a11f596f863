use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{
    CandidateSummary, CurrentMatchResponse, ErrorResponse, FindMatchRequest, HealthResponse,
    MatchFoundResponse,
};
use crate::routes::{engine_error_response, AppState};

/// Configure match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/matches/find", web::post().to(find_match))
        .route("/matches/current/{user_id}", web::get().to(current_match));
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

/// Find a match endpoint
///
/// POST /api/v1/matches/find
///
/// Request body:
/// ```json
/// {
///   "user_id": "uuid"
/// }
/// ```
///
/// Reserves both users, records the match and opens a pending credit
/// transaction for the requester. Returns 404 when no candidate fits.
async fn find_match(
    state: web::Data<AppState>,
    req: web::Json<FindMatchRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    tracing::info!("Finding match for user: {}", req.user_id);

    match state.matching.find_match(req.user_id).await {
        Ok(outcome) => {
            let response = MatchFoundResponse {
                match_id: outcome.match_record.id,
                compatibility_score: outcome.match_record.compatibility_score,
                distance_km: outcome.match_record.distance_km,
                tier: outcome.match_record.tier,
                candidate: CandidateSummary::from(&outcome.candidate),
            };
            HttpResponse::Ok().json(response)
        }
        Err(e) => engine_error_response(&e),
    }
}

/// Current match endpoint
///
/// GET /api/v1/matches/current/{user_id}
///
/// Returns the user's active match, or `{"match": null}` when there is none.
async fn current_match(
    state: web::Data<AppState>,
    path: web::Path<uuid::Uuid>,
) -> impl Responder {
    let user_id = path.into_inner();

    match state.matching.current_match(user_id).await {
        Ok(current) => HttpResponse::Ok().json(CurrentMatchResponse { current }),
        Err(e) => engine_error_response(&e),
    }
}
