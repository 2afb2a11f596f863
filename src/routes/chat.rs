use actix_web::{web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    EndConversationRequest, ErrorResponse, SendMessageRequest, SendMessageResponse,
    StartConversationRequest, StartConversationResponse,
};
use crate::routes::{engine_error_response, AppState};

/// Configure conversation routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/chat/start", web::post().to(start_conversation))
        .route("/chat/{conversation_id}/send", web::post().to(send_message))
        .route("/chat/{conversation_id}/end", web::post().to(end_conversation));
}

/// Start a conversation for an active match
///
/// POST /api/v1/chat/start
///
/// Request body:
/// ```json
/// {
///   "user_id": "uuid",
///   "match_id": "uuid"
/// }
/// ```
///
/// Gated on credits: subscribed users always pass, everyone else needs
/// at least one credit. Returns 402 when the gate refuses.
async fn start_conversation(
    state: web::Data<AppState>,
    req: web::Json<StartConversationRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    tracing::info!(
        "Starting conversation: match={} user={}",
        req.match_id,
        req.user_id
    );

    match state.conversations.start(req.match_id, req.user_id).await {
        Ok(conversation) => HttpResponse::Created().json(StartConversationResponse {
            conversation_id: conversation.id,
            reveal_progress: conversation.reveal_progress,
        }),
        Err(e) => engine_error_response(&e),
    }
}

/// Send a message in a conversation
///
/// POST /api/v1/chat/{conversation_id}/send
///
/// The first user message confirms the pending credit transaction and
/// debits the credit. Each message advances photo reveal by one percent,
/// capped at 100.
async fn send_message(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: web::Json<SendMessageRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let conversation_id = path.into_inner();
    let content = req.content.clone();

    match state
        .conversations
        .send_message(conversation_id, req.user_id, content)
        .await
    {
        Ok((message, conversation)) => HttpResponse::Ok().json(SendMessageResponse {
            data: message,
            reveal_progress: conversation.reveal_progress,
            messages_count: conversation.messages_count,
        }),
        Err(e) => engine_error_response(&e),
    }
}

/// End a conversation
///
/// POST /api/v1/chat/{conversation_id}/end
///
/// Closes the conversation and its match, frees both participants and
/// cancels any still-pending credit transaction. Idempotent.
async fn end_conversation(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: web::Json<EndConversationRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let conversation_id = path.into_inner();

    match state.conversations.end(conversation_id, req.user_id).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        Err(e) => engine_error_response(&e),
    }
}
