use std::sync::Arc;

use actix_web::{
    error::{ErrorBadRequest, ErrorInternalServerError, ErrorNotFound, ErrorServiceUnavailable},
    get, post, web, HttpResponse, Responder,
};
use chrono::Utc;
use tracing::{error, warn};
use uuid::Uuid;

use crate::health;
use crate::meals;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{profile::ProfileChanges, HealthAssessment, MealSuggestion, UserProfile};
use crate::types::{AssessmentRequest, AssessmentResponse};
use crate::AppState;

const MEAL_TYPES: [&str; 3] = ["breakfast", "lunch", "dinner"];

/// Runs a full assessment: computed metrics, an AI analysis, and one meal
/// suggestion per meal of the day, persisted together. The profile is
/// refreshed from the submitted measurements as a side effect.
#[post("")]
pub async fn create_assessment(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
    req_body: web::Json<AssessmentRequest>,
) -> Result<impl Responder, actix_web::Error> {
    let req = req_body.into_inner();

    health::validate_measurements(req.height_cm, req.weight_kg, Some(req.age))
        .map_err(ErrorBadRequest)?;

    let bmi = health::bmi(req.height_cm, req.weight_kg)
        .ok_or_else(|| ErrorBadRequest("measurements must be positive"))?;
    let bmi_category = health::BmiCategory::from_bmi(bmi);

    let activity_level = req.activity_level.as_deref().unwrap_or("sedentary");
    let health_goal = req.health_goal.as_deref().unwrap_or("maintain");
    let preferences = req.dietary_preferences.as_deref().filter(|p| !p.is_empty());
    let allergies = req.food_allergies.as_deref().filter(|a| !a.is_empty());

    let bmr = health::bmr(req.weight_kg, req.height_cm, req.age, &req.sex);
    let maintenance = health::maintenance_calories(bmr, health::activity_multiplier(activity_level));
    let target = health::target_calories(maintenance, health_goal);
    let per_meal = target / MEAL_TYPES.len() as i32;

    // All four completion calls in flight at once; one hard failure degrades
    // the whole assessment to 503 with nothing persisted.
    let (analysis, breakfast, lunch, dinner) = futures::try_join!(
        meals::generate_analysis(
            &app_state.completion,
            bmi,
            bmi_category.label(),
            target,
            health_goal,
            preferences,
            allergies,
        ),
        meals::generate_meal(
            &app_state.completion,
            MEAL_TYPES[0],
            per_meal,
            health_goal,
            preferences,
            allergies,
        ),
        meals::generate_meal(
            &app_state.completion,
            MEAL_TYPES[1],
            per_meal,
            health_goal,
            preferences,
            allergies,
        ),
        meals::generate_meal(
            &app_state.completion,
            MEAL_TYPES[2],
            per_meal,
            health_goal,
            preferences,
            allergies,
        ),
    )
    .map_err(|e| {
        warn!("Completion unavailable during assessment: {e:#}");
        ErrorServiceUnavailable("suggestion service is unavailable, try again later")
    })?;

    let assessment = HealthAssessment {
        id: Uuid::new_v4(),
        user_id: authenticated_user.user_id.clone(),
        height_cm: req.height_cm,
        weight_kg: req.weight_kg,
        age: Some(req.age),
        sex: req.sex.clone(),
        activity_level: activity_level.to_string(),
        health_goal: health_goal.to_string(),
        bmi,
        bmi_category: bmi_category.label().to_string(),
        bmr,
        maintenance_calories: maintenance,
        target_calories: target,
        dietary_preferences: preferences.unwrap_or("").to_string(),
        food_allergies: allergies.unwrap_or("").to_string(),
        analysis,
        created_at: Utc::now(),
    };

    let mut tx = app_state.pool.begin().await.map_err(|e| {
        error!("Error starting transaction: {:?}", e);
        ErrorInternalServerError(e.to_string())
    })?;

    let stored = HealthAssessment::create(&mut tx, &assessment)
        .await
        .map_err(|e| {
            error!("Error saving assessment: {:?}", e);
            ErrorInternalServerError(e.to_string())
        })?;

    let mut stored_meals = Vec::with_capacity(MEAL_TYPES.len());
    for generated in [breakfast, lunch, dinner] {
        let meal = MealSuggestion {
            id: Uuid::new_v4(),
            assessment_id: stored.id,
            meal_type: generated.meal_type,
            name: generated.name,
            description: generated.description,
            calories: generated.calories,
            protein_g: generated.protein_g,
            carbs_g: generated.carbs_g,
            fats_g: generated.fats_g,
            ingredients: generated.ingredients,
            preparation: generated.preparation,
        };
        MealSuggestion::create(&mut tx, &meal).await.map_err(|e| {
            error!("Error saving meal suggestion: {:?}", e);
            ErrorInternalServerError(e.to_string())
        })?;
        stored_meals.push(meal);
    }

    tx.commit().await.map_err(|e| {
        error!("Error committing assessment: {:?}", e);
        ErrorInternalServerError(e.to_string())
    })?;

    let changes = ProfileChanges {
        height_cm: Some(req.height_cm),
        weight_kg: Some(req.weight_kg),
        sex: Some(req.sex),
        activity_level: Some(activity_level.to_string()),
        health_goals: Some(health_goal.to_string()),
        dietary_preferences: req.dietary_preferences.clone(),
        food_allergies: req.food_allergies.clone(),
        target_calories: Some(target),
        ..Default::default()
    };
    UserProfile::update(&app_state.pool, &authenticated_user.user_id, &changes)
        .await
        .map_err(|e| {
            error!("Error refreshing profile from assessment: {:?}", e);
            ErrorInternalServerError(e.to_string())
        })?;

    let macros = health::macro_split(stored.target_calories, &stored.health_goal);

    Ok(HttpResponse::Ok().json(AssessmentResponse {
        assessment: stored,
        macros,
        meals: stored_meals,
    }))
}

#[get("")]
pub async fn list_assessments(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
) -> Result<impl Responder, actix_web::Error> {
    let assessments =
        HealthAssessment::list_for_owner(&app_state.pool, &authenticated_user.user_id)
            .await
            .map_err(|e| {
                error!("Error listing assessments: {:?}", e);
                ErrorInternalServerError(e.to_string())
            })?;

    Ok(HttpResponse::Ok().json(assessments))
}

#[get("/{assessment_id}")]
pub async fn get_assessment(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, actix_web::Error> {
    let assessment_id = path.into_inner();

    let assessment =
        HealthAssessment::get_owned(&app_state.pool, assessment_id, &authenticated_user.user_id)
            .await
            .map_err(|e| {
                error!("Error getting assessment: {:?}", e);
                ErrorInternalServerError(e.to_string())
            })?
            .ok_or_else(|| ErrorNotFound("assessment not found"))?;

    let meals = MealSuggestion::list_for_assessment(&app_state.pool, assessment_id)
        .await
        .map_err(|e| {
            error!("Error listing meal suggestions: {:?}", e);
            ErrorInternalServerError(e.to_string())
        })?;

    let macros = health::macro_split(assessment.target_calories, &assessment.health_goal);

    Ok(HttpResponse::Ok().json(AssessmentResponse {
        assessment,
        macros,
        meals,
    }))
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
    async fn implausible_measurements_are_rejected() {
        let config = test_config();
        let state = test_state(&config);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .app_data(web::Data::new(config.clone()))
                .wrap(Authentication {
                    app_config: config.clone(),
                })
                .service(web::scope("/assessments").service(create_assessment)),
        )
        .await;

        let token = sign_token(&config, "user_test").unwrap();
        for body in [
            serde_json::json!({ "height_cm": 40.0, "weight_kg": 70.0, "age": 30, "sex": "m" }),
            serde_json::json!({ "height_cm": 170.0, "weight_kg": 500.0, "age": 30, "sex": "m" }),
            serde_json::json!({ "height_cm": 170.0, "weight_kg": 70.0, "age": 0, "sex": "m" }),
        ] {
            let req = test::TestRequest::post()
                .uri("/assessments")
                .insert_header(("Authorization", format!("Bearer {token}")))
                .set_json(&body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }
    }
}
