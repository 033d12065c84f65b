use serde::Serialize;

use crate::models::UserProfile;

#[derive(Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub bmi: Option<f64>,
    pub bmi_category: Option<String>,
    pub ideal_weight_range: Option<(f64, f64)>,
    pub recommended_water_liters: Option<f64>,
}
