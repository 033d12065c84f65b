use serde::{Deserialize, Serialize};

use crate::health::MacroSplit;
use crate::models::{HealthAssessment, MealSuggestion};

#[derive(Deserialize)]
pub struct AssessmentRequest {
    pub height_cm: f64,
    pub weight_kg: f64,
    pub age: i32,
    pub sex: String,
    #[serde(default)]
    pub activity_level: Option<String>,
    #[serde(default)]
    pub health_goal: Option<String>,
    #[serde(default)]
    pub dietary_preferences: Option<String>,
    #[serde(default)]
    pub food_allergies: Option<String>,
}

#[derive(Serialize)]
pub struct AssessmentResponse {
    #[serde(flatten)]
    pub assessment: HealthAssessment,
    pub macros: MacroSplit,
    pub meals: Vec<MealSuggestion>,
}
