use std::sync::Arc;

use actix_web::{
    error::{ErrorBadRequest, ErrorInternalServerError},
    post, web, HttpResponse, Responder,
};
use tracing::error;

use crate::chat;
use crate::middleware::auth::AuthenticatedUser;
use crate::types::{ChatRequest, ChatResponse};
use crate::AppState;

/// One chat turn. The user message is persisted even when the completion
/// service is down; that degraded turn comes back as 503 with the same body
/// shape so the client still learns the stored message ids.
#[post("")]
pub async fn send_chat(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
    req_body: web::Json<ChatRequest>,
) -> Result<impl Responder, actix_web::Error> {
    let message = req_body.message.trim();
    if message.is_empty() {
        return Err(ErrorBadRequest("message must not be empty"));
    }

    let outcome = chat::handle_turn(
        &app_state.pool,
        &app_state.completion,
        &authenticated_user.user_id,
        req_body.conversation_id,
        message,
        req_body.bmi_category.as_deref(),
    )
    .await
    .map_err(|e| {
        error!("Error handling chat turn: {:?}", e);
        ErrorInternalServerError(e.to_string())
    })?;

    let body = ChatResponse {
        response: outcome.assistant_message.body.clone(),
        conversation_id: outcome.conversation.id,
        conversation_title: outcome.conversation.title.clone(),
        conversation_updated_at: outcome.conversation.updated_at,
        user_message_id: outcome.user_message.id,
        assistant_message_id: outcome.assistant_message.id,
    };

    if outcome.completion_failed {
        Ok(HttpResponse::ServiceUnavailable().json(body))
    } else {
        Ok(HttpResponse::Ok().json(body))
    }
}
