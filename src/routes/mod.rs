// Route exports
pub mod chat;
pub mod internal;
pub mod matches;

use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::models::ErrorResponse;
use crate::services::{
    ConversationService, EngineError, MatchService, PostgresClient, StoreError,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<PostgresClient>,
    pub matching: Arc<MatchService>,
    pub conversations: Arc<ConversationService>,
    pub cron_secret: Option<String>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(matches::configure)
            .configure(chat::configure)
            .configure(internal::configure),
    );
}

/// Map an engine error onto an HTTP response with a structured body.
///
/// Expected outcomes (no match, already busy, no credits) come back as
/// client-side statuses so the app can branch on them without string
/// matching; real faults log at error level and return 500.
pub(crate) fn engine_error_response(err: &EngineError) -> HttpResponse {
    let (status, error) = match err {
        EngineError::NoMatchFound => (404, "No match found"),
        EngineError::AlreadyInConversation => (400, "Already in conversation"),
        EngineError::NoCredits => (402, "Not enough credits"),
        EngineError::PendingExists => (409, "Pending transaction exists"),
        EngineError::InvalidTransition => (409, "Invalid transaction state"),
        EngineError::NotParticipant => (403, "Not a participant"),
        EngineError::MatchClosed => (410, "Match closed"),
        EngineError::ConversationClosed => (410, "Conversation closed"),
        EngineError::Store(StoreError::NotFound(_)) => (404, "Not found"),
        EngineError::Store(_) => (500, "Internal error"),
    };

    if status == 500 {
        tracing::error!("Request failed: {}", err);
    } else if !err.is_expected() {
        tracing::warn!("Request rejected: {}", err);
    }

    let body = ErrorResponse {
        error: error.to_string(),
        message: err.to_string(),
        status_code: status,
    };

    match status {
        400 => HttpResponse::BadRequest().json(body),
        402 => HttpResponse::PaymentRequired().json(body),
        403 => HttpResponse::Forbidden().json(body),
        404 => HttpResponse::NotFound().json(body),
        409 => HttpResponse::Conflict().json(body),
        410 => HttpResponse::Gone().json(body),
        _ => HttpResponse::InternalServerError().json(body),
    }
}
