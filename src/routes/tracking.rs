use std::sync::Arc;

use actix_web::{
    error::{ErrorBadRequest, ErrorInternalServerError},
    get, post, web, HttpResponse, Responder,
};
use chrono::Utc;
use tracing::error;
use uuid::Uuid;

use crate::health;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{ProgressEntry, UserProfile};
use crate::types::{ProgressHistoryParams, ProgressRequest};
use crate::AppState;

const MAX_HISTORY_LIMIT: i64 = 365;

#[post("")]
pub async fn log_progress(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
    req_body: web::Json<ProgressRequest>,
) -> Result<impl Responder, actix_web::Error> {
    let req = req_body.into_inner();

    for (label, level) in [("mood", req.mood_level), ("energy", req.energy_level)] {
        if let Some(level) = level {
            if !(1..=10).contains(&level) {
                return Err(ErrorBadRequest(format!(
                    "{label} level should be between 1 and 10"
                )));
            }
        }
    }
    if let Some(weight) = req.weight_kg {
        if !(20.0..=300.0).contains(&weight) {
            return Err(ErrorBadRequest("weight should be between 20kg and 300kg"));
        }
    }
    if let Some(water) = req.water_liters {
        if water < 0.0 {
            return Err(ErrorBadRequest("water intake must not be negative"));
        }
    }
    for (label, value) in [
        ("calories consumed", req.calories_consumed),
        ("steps", req.steps),
        ("workout minutes", req.workout_minutes),
    ] {
        if let Some(value) = value {
            if value < 0 {
                return Err(ErrorBadRequest(format!("{label} must not be negative")));
            }
        }
    }

    // A logged weight yields a BMI snapshot when the profile knows a height.
    let bmi = match req.weight_kg {
        Some(weight) => {
            UserProfile::get_or_create(&app_state.pool, &authenticated_user.user_id)
                .await
                .map_err(|e| {
                    error!("Error getting profile: {:?}", e);
                    ErrorInternalServerError(e.to_string())
                })?
                .height_cm
                .and_then(|height| health::bmi(height, weight))
        }
        None => None,
    };

    let entry = ProgressEntry {
        id: Uuid::new_v4(),
        user_id: authenticated_user.user_id.clone(),
        entry_date: req.entry_date.unwrap_or_else(|| Utc::now().date_naive()),
        weight_kg: req.weight_kg,
        bmi,
        calories_consumed: req.calories_consumed,
        water_liters: req.water_liters,
        steps: req.steps,
        workout_minutes: req.workout_minutes,
        mood_level: req.mood_level,
        energy_level: req.energy_level,
        notes: req.notes.unwrap_or_default(),
        created_at: Utc::now(),
    };

    let stored = ProgressEntry::upsert(&app_state.pool, &entry)
        .await
        .map_err(|e| {
            error!("Error saving progress entry: {:?}", e);
            ErrorInternalServerError(e.to_string())
        })?;

    Ok(HttpResponse::Ok().json(stored))
}

#[get("")]
pub async fn progress_history(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
    params: web::Query<ProgressHistoryParams>,
) -> Result<impl Responder, actix_web::Error> {
    if params.limit <= 0 || params.limit > MAX_HISTORY_LIMIT {
        return Err(ErrorBadRequest(format!(
            "limit must be between 1 and {MAX_HISTORY_LIMIT}"
        )));
    }

    let entries =
        ProgressEntry::list_for_owner(&app_state.pool, &authenticated_user.user_id, params.limit)
            .await
            .map_err(|e| {
                error!("Error listing progress entries: {:?}", e);
                ErrorInternalServerError(e.to_string())
            })?;

    Ok(HttpResponse::Ok().json(entries))
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
    async fn out_of_range_levels_are_rejected() {
        let config = test_config();
        let state = test_state(&config);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .app_data(web::Data::new(config.clone()))
                .wrap(Authentication {
                    app_config: config.clone(),
                })
                .service(web::scope("/progress").service(log_progress)),
        )
        .await;

        let token = sign_token(&config, "user_test").unwrap();
        for body in [
            serde_json::json!({ "mood_level": 0 }),
            serde_json::json!({ "mood_level": 11 }),
            serde_json::json!({ "energy_level": -3 }),
            serde_json::json!({ "water_liters": -0.5 }),
            serde_json::json!({ "steps": -100 }),
            serde_json::json!({ "workout_minutes": -10 }),
            serde_json::json!({ "calories_consumed": -200 }),
        ] {
            let req = test::TestRequest::post()
                .uri("/progress")
                .insert_header(("Authorization", format!("Bearer {token}")))
                .set_json(&body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }
    }
}
