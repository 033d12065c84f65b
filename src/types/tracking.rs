use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct ProgressRequest {
    #[serde(default)]
    pub entry_date: Option<NaiveDate>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub calories_consumed: Option<i32>,
    #[serde(default)]
    pub water_liters: Option<f64>,
    #[serde(default)]
    pub steps: Option<i32>,
    #[serde(default)]
    pub workout_minutes: Option<i32>,
    #[serde(default)]
    pub mood_level: Option<i32>,
    #[serde(default)]
    pub energy_level: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_history_limit() -> i64 {
    30
}

#[derive(Deserialize)]
pub struct ProgressHistoryParams {
    #[serde(default = "default_history_limit")]
    pub limit: i64,
}
