use std::sync::Arc;

use actix_web::{error::ErrorInternalServerError, get, post, web, HttpResponse, Responder};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::middleware::auth::AuthenticatedUser;
use crate::models::User;
use crate::types::{AuthTokenResponse, RegisterRequest};
use crate::{AppConfig, AppState};

const TOKEN_LIFETIME_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

pub fn sign_token(config: &AppConfig, user_id: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (now + Duration::days(TOKEN_LIFETIME_DAYS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_ref()),
    )
}

#[post("/register")]
pub async fn register(
    app_state: web::Data<Arc<AppState>>,
    app_config: web::Data<Arc<AppConfig>>,
    req_body: web::Json<RegisterRequest>,
) -> Result<impl Responder, actix_web::Error> {
    let email = req_body.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(actix_web::error::ErrorBadRequest("a valid email is required"));
    }

    let user = User::upsert(
        &app_state.pool,
        email,
        req_body.first_name.as_deref().unwrap_or(""),
        req_body.last_name.as_deref().unwrap_or(""),
    )
    .await
    .map_err(|e| {
        error!("Error upserting user: {:?}", e);
        ErrorInternalServerError(e.to_string())
    })?;

    let token = sign_token(&app_config, &user.id).map_err(|e| {
        error!("Error signing token: {:?}", e);
        ErrorInternalServerError(e.to_string())
    })?;

    Ok(HttpResponse::Ok().json(AuthTokenResponse {
        token,
        user_id: user.id,
    }))
}

#[get("/user")]
pub async fn get_user(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
) -> Result<impl Responder, actix_web::Error> {
    let user = User::get_by_id(&app_state.pool, &authenticated_user.user_id)
        .await
        .map_err(|e| {
            error!("Error getting user: {:?}", e);
            ErrorInternalServerError(e.to_string())
        })?
        .ok_or_else(|| actix_web::error::ErrorNotFound("user not found"))?;

    Ok(HttpResponse::Ok().json(user))
}
