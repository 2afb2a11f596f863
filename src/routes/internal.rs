use actix_web::{web, HttpRequest, HttpResponse, Responder};

use crate::models::{ErrorResponse, ReconcileResponse};
use crate::routes::{engine_error_response, AppState};

const CRON_SECRET_HEADER: &str = "X-Cron-Secret";

/// Configure internal maintenance routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/internal/reconcile", web::post().to(reconcile));
}

#[derive(Debug, PartialEq, Eq)]
enum CronAccess {
    Granted,
    /// No secret configured; the endpoint stays closed rather than open
    Misconfigured,
    Denied,
}

fn check_cron_access(configured: Option<&str>, provided: Option<&str>) -> CronAccess {
    match configured {
        None => CronAccess::Misconfigured,
        Some(expected) if provided == Some(expected) => CronAccess::Granted,
        Some(_) => CronAccess::Denied,
    }
}

/// Reconciliation sweep
///
/// POST /api/v1/internal/reconcile
///
/// Frees users flagged as in-conversation with no active match or
/// conversation backing the flag, and cancels their stranded pending
/// transactions. Meant to be called by a scheduler; requires the
/// X-Cron-Secret header, and refuses outright when no secret is
/// configured.
async fn reconcile(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let provided = req
        .headers()
        .get(CRON_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());

    match check_cron_access(state.cron_secret.as_deref(), provided) {
        CronAccess::Granted => {}
        CronAccess::Misconfigured => {
            tracing::error!("Reconcile called but no cron secret is configured");
            return HttpResponse::ServiceUnavailable().json(ErrorResponse {
                error: "Reconciliation disabled".to_string(),
                message: "No cron secret configured".to_string(),
                status_code: 503,
            });
        }
        CronAccess::Denied => {
            tracing::warn!("Reconcile called with missing or invalid cron secret");
            return HttpResponse::Unauthorized().json(ErrorResponse {
                error: "Unauthorized".to_string(),
                message: "Missing or invalid cron secret".to_string(),
                status_code: 401,
            });
        }
    }

    match state.conversations.reconcile().await {
        Ok(users_freed) => {
            tracing::info!("Reconciliation sweep freed {} users", users_freed);
            HttpResponse::Ok().json(ReconcileResponse {
                success: true,
                users_freed,
                timestamp: chrono::Utc::now(),
            })
        }
        Err(e) => engine_error_response(&e),
    }
}
