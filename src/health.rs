use serde::{Deserialize, Serialize};

/// BMI rounded to one decimal, or `None` when the measurements are unusable.
pub fn bmi(height_cm: f64, weight_kg: f64) -> Option<f64> {
    if height_cm <= 0.0 || weight_kg <= 0.0 {
        return None;
    }
    let height_m = height_cm / 100.0;
    Some((weight_kg / (height_m * height_m) * 10.0).round() / 10.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal weight",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
        }
    }
}

/// Basal metabolic rate via the Mifflin-St Jeor equation. Anything other than
/// male uses the female branch.
pub fn bmr(weight_kg: f64, height_cm: f64, age: i32, sex: &str) -> i32 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age as f64;
    let adjusted = if sex.eq_ignore_ascii_case("m") {
        base + 5.0
    } else {
        base - 161.0
    };
    adjusted.round() as i32
}

/// Unknown levels fall back to sedentary.
pub fn activity_multiplier(level: &str) -> f64 {
    match level {
        "sedentary" => 1.2,
        "light" => 1.375,
        "moderate" => 1.55,
        "active" => 1.725,
        "very_active" => 1.9,
        _ => 1.2,
    }
}

pub fn maintenance_calories(bmr: i32, multiplier: f64) -> i32 {
    (bmr as f64 * multiplier).round() as i32
}

/// Target daily calories: a fixed 500 kcal offset for loss/gain goals, otherwise
/// maintenance unchanged.
pub fn target_calories(maintenance: i32, goal: &str) -> i32 {
    match goal {
        "weight_loss" => maintenance - 500,
        "muscle_gain" => maintenance + 500,
        _ => maintenance,
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MacroSplit {
    pub protein_g: i32,
    pub carbs_g: i32,
    pub fats_g: i32,
    pub protein_percent: i32,
    pub carbs_percent: i32,
    pub fats_percent: i32,
}

/// Macro distribution over a calorie budget (protein and carbs 4 kcal/g, fat 9).
pub fn macro_split(calories: i32, goal: &str) -> MacroSplit {
    let (protein_ratio, carb_ratio, fat_ratio) = match goal {
        "weight_loss" => (0.35, 0.35, 0.30),
        "muscle_gain" => (0.30, 0.45, 0.25),
        _ => (0.25, 0.50, 0.25),
    };
    let calories = calories as f64;
    MacroSplit {
        protein_g: (calories * protein_ratio / 4.0).round() as i32,
        carbs_g: (calories * carb_ratio / 4.0).round() as i32,
        fats_g: (calories * fat_ratio / 9.0).round() as i32,
        protein_percent: (protein_ratio * 100.0) as i32,
        carbs_percent: (carb_ratio * 100.0) as i32,
        fats_percent: (fat_ratio * 100.0) as i32,
    }
}

/// Weight band corresponding to the healthy BMI range 18.5-24.9.
pub fn ideal_weight_range(height_cm: f64) -> Option<(f64, f64)> {
    if height_cm <= 0.0 {
        return None;
    }
    let height_m = height_cm / 100.0;
    let min = (18.5 * height_m * height_m * 10.0).round() / 10.0;
    let max = (24.9 * height_m * height_m * 10.0).round() / 10.0;
    Some((min, max))
}

/// Recommended daily water intake in liters (33 ml per kg of body weight).
pub fn daily_water_intake(weight_kg: f64) -> f64 {
    (weight_kg * 0.033 * 100.0).round() / 100.0
}

/// Sanity bounds on assessment inputs; returns the first violation.
pub fn validate_measurements(height_cm: f64, weight_kg: f64, age: Option<i32>) -> Result<(), &'static str> {
    if !(50.0..=250.0).contains(&height_cm) {
        return Err("height should be between 50cm and 250cm");
    }
    if !(20.0..=300.0).contains(&weight_kg) {
        return Err("weight should be between 20kg and 300kg");
    }
    if let Some(age) = age {
        if !(1..=120).contains(&age) {
            return Err("age should be between 1 and 120 years");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bmi_reference_value() {
        assert_eq!(bmi(170.0, 70.0), Some(24.2));
        assert_eq!(BmiCategory::from_bmi(24.2), BmiCategory::Normal);
    }

    #[test]
    fn bmi_rejects_bad_measurements() {
        assert_eq!(bmi(0.0, 70.0), None);
        assert_eq!(bmi(-170.0, 70.0), None);
        assert_eq!(bmi(170.0, 0.0), None);
    }

    #[test]
    fn category_boundaries() {
        assert_eq!(BmiCategory::from_bmi(18.4), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(18.5), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(24.9), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(25.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(29.9), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(30.0), BmiCategory::Obese);
    }

    #[test]
    fn mifflin_st_jeor_branches() {
        // 10*70 + 6.25*170 - 5*30 = 1612.5
        assert_eq!(bmr(70.0, 170.0, 30, "M"), 1618);
        assert_eq!(bmr(70.0, 170.0, 30, "F"), 1452);
        // unspecified sex uses the female branch
        assert_eq!(bmr(70.0, 170.0, 30, ""), 1452);
    }

    #[test]
    fn goal_offsets() {
        let maintenance = maintenance_calories(1618, activity_multiplier("moderate"));
        assert_eq!(maintenance, 2508);
        assert_eq!(target_calories(maintenance, "weight_loss"), 2008);
        assert_eq!(target_calories(maintenance, "muscle_gain"), 3008);
        assert_eq!(target_calories(maintenance, "maintain"), 2508);
        assert_eq!(target_calories(maintenance, "improve_health"), 2508);
    }

    #[test]
    fn unknown_activity_level_is_sedentary() {
        assert_eq!(activity_multiplier("couch"), 1.2);
    }

    #[test]
    fn macro_split_percentages_sum() {
        for goal in ["weight_loss", "muscle_gain", "maintain"] {
            let split = macro_split(2000, goal);
            assert_eq!(
                split.protein_percent + split.carbs_percent + split.fats_percent,
                100,
                "goal {goal}"
            );
            assert!(split.protein_g > 0 && split.carbs_g > 0 && split.fats_g > 0);
        }
    }

    #[test]
    fn macro_split_maintain_grams() {
        let split = macro_split(2000, "maintain");
        assert_eq!(split.protein_g, 125);
        assert_eq!(split.carbs_g, 250);
        assert_eq!(split.fats_g, 56);
    }

    #[test]
    fn water_and_ideal_weight() {
        assert_eq!(daily_water_intake(70.0), 2.31);
        let (min, max) = ideal_weight_range(170.0).unwrap();
        assert_eq!(min, 53.5);
        assert_eq!(max, 72.0);
        assert_eq!(ideal_weight_range(0.0), None);
    }

    #[test]
    fn measurement_validation() {
        assert!(validate_measurements(170.0, 70.0, Some(30)).is_ok());
        assert!(validate_measurements(49.0, 70.0, None).is_err());
        assert!(validate_measurements(170.0, 301.0, None).is_err());
        assert!(validate_measurements(170.0, 70.0, Some(0)).is_err());
        assert!(validate_measurements(170.0, 70.0, None).is_ok());
    }
}
