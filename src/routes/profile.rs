use std::sync::Arc;

use actix_web::{
    error::{ErrorBadRequest, ErrorInternalServerError},
    get, put, web, HttpResponse, Responder,
};
use tracing::error;

use crate::middleware::auth::AuthenticatedUser;
use crate::models::{profile::ProfileChanges, UserProfile};
use crate::types::ProfileResponse;
use crate::AppState;

fn with_derived_metrics(profile: UserProfile) -> ProfileResponse {
    let bmi = profile.bmi();
    let bmi_category = profile
        .bmi_category()
        .map(|category| category.label().to_string());
    let ideal_weight_range = profile.height_cm.and_then(crate::health::ideal_weight_range);
    let recommended_water_liters = profile.weight_kg.map(crate::health::daily_water_intake);
    ProfileResponse {
        profile,
        bmi,
        bmi_category,
        ideal_weight_range,
        recommended_water_liters,
    }
}

#[get("")]
pub async fn get_profile(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
) -> Result<impl Responder, actix_web::Error> {
    let profile = UserProfile::get_or_create(&app_state.pool, &authenticated_user.user_id)
        .await
        .map_err(|e| {
            error!("Error getting profile: {:?}", e);
            ErrorInternalServerError(e.to_string())
        })?;

    Ok(HttpResponse::Ok().json(with_derived_metrics(profile)))
}

#[put("")]
pub async fn update_profile(
    app_state: web::Data<Arc<AppState>>,
    authenticated_user: AuthenticatedUser,
    req_body: web::Json<ProfileChanges>,
) -> Result<impl Responder, actix_web::Error> {
    let changes = req_body.into_inner();

    if let Some(height) = changes.height_cm {
        if !(50.0..=250.0).contains(&height) {
            return Err(ErrorBadRequest("height should be between 50cm and 250cm"));
        }
    }
    if let Some(weight) = changes.weight_kg {
        if !(20.0..=300.0).contains(&weight) {
            return Err(ErrorBadRequest("weight should be between 20kg and 300kg"));
        }
    }
    if let Some(water_goal) = changes.water_goal_liters {
        if !(0.5..=10.0).contains(&water_goal) {
            return Err(ErrorBadRequest("water goal should be between 0.5L and 10L"));
        }
    }

    let profile = UserProfile::update(&app_state.pool, &authenticated_user.user_id, &changes)
        .await
        .map_err(|e| {
            error!("Error updating profile: {:?}", e);
            ErrorInternalServerError(e.to_string())
        })?;

    Ok(HttpResponse::Ok().json(with_derived_metrics(profile)))
}
