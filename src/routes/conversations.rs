use std::sync::Arc;

use actix_web::{
    delete,
    error::{ErrorBadRequest, ErrorInternalServerError, ErrorNotFound},
    get, put, web, HttpResponse, Responder,
};
use tracing::error;
use uuid::Uuid;

use crate::middleware::auth::AuthenticatedUser;
use crate::models::{conversation::TITLE_MAX_CHARS, Conversation, Message};
use crate::types::{
    ConversationDetailResponse, ConversationListResponse, DeletedCountResponse, ListParams,
    PinConversationRequest, RenameConversationRequest,
};
use crate::AppState;

const MAX_PAGE_SIZE: i64 = 100;

#[get("")]
pub async fn list_conversations(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
    params: web::Query<ListParams>,
) -> Result<impl Responder, actix_web::Error> {
    if params.limit <= 0 || params.limit > MAX_PAGE_SIZE {
        return Err(ErrorBadRequest(format!(
            "limit must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    if params.offset < 0 {
        return Err(ErrorBadRequest("offset must not be negative"));
    }

    let conversations = Conversation::list_for_owner(
        &app_state.pool,
        &authenticated_user.user_id,
        params.limit,
        params.offset,
    )
    .await
    .map_err(|e| {
        error!("Error listing conversations: {:?}", e);
        ErrorInternalServerError(e.to_string())
    })?;

    let total = Conversation::count_for_owner(&app_state.pool, &authenticated_user.user_id)
        .await
        .map_err(|e| {
            error!("Error counting conversations: {:?}", e);
            ErrorInternalServerError(e.to_string())
        })?;

    Ok(HttpResponse::Ok().json(ConversationListResponse {
        conversations,
        total,
        limit: params.limit,
        offset: params.offset,
    }))
}

/// Full transcript of one conversation. Reading it marks the conversation
/// read, so its derived unread count drops to zero.
#[get("/{conversation_id}")]
pub async fn get_conversation(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, actix_web::Error> {
    let conversation_id = path.into_inner();

    let mut conversation =
        Conversation::get_owned(&app_state.pool, conversation_id, &authenticated_user.user_id)
            .await
            .map_err(|e| {
                error!("Error getting conversation: {:?}", e);
                ErrorInternalServerError(e.to_string())
            })?
            .ok_or_else(|| ErrorNotFound("conversation not found"))?;

    let messages = Message::list_for_conversation(&app_state.pool, conversation_id)
        .await
        .map_err(|e| {
            error!("Error listing messages: {:?}", e);
            ErrorInternalServerError(e.to_string())
        })?;

    conversation.last_read_at =
        Conversation::mark_read(&app_state.pool, conversation_id, &authenticated_user.user_id)
            .await
            .map_err(|e| {
                error!("Error marking conversation read: {:?}", e);
                ErrorInternalServerError(e.to_string())
            })?;

    Ok(HttpResponse::Ok().json(ConversationDetailResponse {
        conversation,
        messages,
    }))
}

#[put("/{conversation_id}")]
pub async fn rename_conversation(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
    path: web::Path<Uuid>,
    req_body: web::Json<RenameConversationRequest>,
) -> Result<impl Responder, actix_web::Error> {
    let title = req_body.title.trim();
    if title.is_empty() {
        return Err(ErrorBadRequest("title must not be empty"));
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(ErrorBadRequest(format!(
            "title must be at most {TITLE_MAX_CHARS} characters"
        )));
    }

    let conversation = Conversation::rename(
        &app_state.pool,
        path.into_inner(),
        &authenticated_user.user_id,
        title,
    )
    .await
    .map_err(|e| {
        error!("Error renaming conversation: {:?}", e);
        ErrorInternalServerError(e.to_string())
    })?
    .ok_or_else(|| ErrorNotFound("conversation not found"))?;

    Ok(HttpResponse::Ok().json(conversation))
}

#[put("/{conversation_id}/pin")]
pub async fn pin_conversation(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
    path: web::Path<Uuid>,
    req_body: web::Json<PinConversationRequest>,
) -> Result<impl Responder, actix_web::Error> {
    let conversation = Conversation::set_pinned(
        &app_state.pool,
        path.into_inner(),
        &authenticated_user.user_id,
        req_body.pinned,
    )
    .await
    .map_err(|e| {
        error!("Error pinning conversation: {:?}", e);
        ErrorInternalServerError(e.to_string())
    })?
    .ok_or_else(|| ErrorNotFound("conversation not found"))?;

    Ok(HttpResponse::Ok().json(conversation))
}

#[delete("/{conversation_id}")]
pub async fn delete_conversation(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, actix_web::Error> {
    let deleted = Conversation::delete(
        &app_state.pool,
        path.into_inner(),
        &authenticated_user.user_id,
    )
    .await
    .map_err(|e| {
        error!("Error deleting conversation: {:?}", e);
        ErrorInternalServerError(e.to_string())
    })?;

    if !deleted {
        return Err(ErrorNotFound("conversation not found"));
    }

    Ok(HttpResponse::Ok().finish())
}

#[delete("")]
pub async fn clear_conversations(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
) -> Result<impl Responder, actix_web::Error> {
    let deleted_count =
        Conversation::delete_all_for_owner(&app_state.pool, &authenticated_user.user_id)
            .await
            .map_err(|e| {
                error!("Error clearing conversations: {:?}", e);
                ErrorInternalServerError(e.to_string())
            })?;

    Ok(HttpResponse::Ok().json(DeletedCountResponse { deleted_count }))
}

#[cfg(test)]
mod tests {
    use super::*;

    use actix_web::{http::StatusCode, test, App};
    use sqlx::PgPool;

    use crate::completion::CompletionClient;
    use crate::middleware::auth::Authentication;
    use crate::routes::auth::sign_token;
    use crate::AppConfig;

    fn test_config() -> Arc<AppConfig> {
        Arc::new(AppConfig {
            database_url: "postgres://localhost:1/never_connected".to_string(),
            jwt_secret: "test-secret".to_string(),
            completion_api_base: "http://localhost:1/v1".to_string(),
            completion_api_key: "local".to_string(),
            completion_model: "qwen".to_string(),
            completion_timeout: std::time::Duration::from_secs(1),
            host: "127.0.0.1".to_string(),
            port: 0,
        })
    }

    fn test_state(config: &AppConfig) -> Arc<AppState> {
        let pool = PgPool::connect_lazy(&config.database_url)
            .expect("lazy pool construction should not fail");
        Arc::new(AppState {
            pool,
            completion: CompletionClient::new(config),
        })
    }

    #[actix_web::test]
    async fn out_of_range_pagination_is_rejected() {
        let config = test_config();
        let state = test_state(&config);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .app_data(web::Data::new(config.clone()))
                .wrap(Authentication {
                    app_config: config.clone(),
                })
                .service(web::scope("/conversations").service(list_conversations)),
        )
        .await;

        let token = sign_token(&config, "user_test").unwrap();
        for uri in [
            "/conversations?limit=0",
            "/conversations?limit=101",
            "/conversations?offset=-1",
        ] {
            let req = test::TestRequest::get()
                .uri(uri)
                .insert_header(("Authorization", format!("Bearer {token}")))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "uri {uri}");
        }
    }

    #[actix_web::test]
    async fn malformed_pagination_is_rejected() {
        let config = test_config();
        let state = test_state(&config);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .app_data(web::Data::new(config.clone()))
                .wrap(Authentication {
                    app_config: config.clone(),
                })
                .service(web::scope("/conversations").service(list_conversations)),
        )
        .await;

        let token = sign_token(&config, "user_test").unwrap();
        let req = test::TestRequest::get()
            .uri("/conversations?limit=abc")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn empty_rename_title_is_rejected() {
        let config = test_config();
        let state = test_state(&config);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .app_data(web::Data::new(config.clone()))
                .wrap(Authentication {
                    app_config: config.clone(),
                })
                .service(web::scope("/conversations").service(rename_conversation)),
        )
        .await;

        let token = sign_token(&config, "user_test").unwrap();
        let req = test::TestRequest::put()
            .uri(&format!("/conversations/{}", Uuid::new_v4()))
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(serde_json::json!({ "title": "  " }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
