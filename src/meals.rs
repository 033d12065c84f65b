use anyhow::Result;
use serde::Deserialize;
use tracing::warn;

use crate::completion::{self, CompletionClient};
use crate::prompts::Prompts;

const MEAL_TEMPERATURE: f32 = 0.7;
const MEAL_MAX_TOKENS: u32 = 300;
const ANALYSIS_MAX_TOKENS: u32 = 200;

/// One generated meal, macros already apportioned over its calorie budget.
#[derive(Debug, Clone)]
pub struct GeneratedMeal {
    pub meal_type: String,
    pub name: String,
    pub description: String,
    pub ingredients: String,
    pub preparation: String,
    pub calories: i32,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fats_g: f64,
}

#[derive(Debug, Deserialize)]
struct MealJson {
    name: Option<String>,
    description: Option<String>,
    ingredients: Option<String>,
    preparation: Option<String>,
}

/// First balanced JSON object in the text. Model replies routinely wrap the
/// object in markdown fences or trail it with prose, so a plain
/// `serde_json::from_str` over the whole reply is not enough.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Per-meal macro ratios by goal; fat takes the remainder.
fn meal_macro_ratios(goal: &str) -> (f64, f64) {
    match goal {
        "muscle_gain" => (0.35, 0.50),
        "weight_loss" => (0.30, 0.45),
        _ => (0.25, 0.50),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Turns a model reply into a meal, falling back to a generic meal when the
/// reply holds no parseable JSON.
pub fn parse_meal(meal_type: &str, calories: i32, goal: &str, response: &str) -> GeneratedMeal {
    let parsed = extract_json_object(response)
        .and_then(|json| serde_json::from_str::<MealJson>(json).ok())
        .unwrap_or_else(|| {
            warn!("Unparseable meal reply for {meal_type}, using fallback meal");
            MealJson {
                name: None,
                description: None,
                ingredients: None,
                preparation: None,
            }
        });

    let (protein_ratio, carb_ratio) = meal_macro_ratios(goal);
    let fat_ratio = 1.0 - (protein_ratio + carb_ratio);
    let calories_f = calories as f64;

    GeneratedMeal {
        meal_type: meal_type.to_string(),
        name: parsed
            .name
            .unwrap_or_else(|| format!("Healthy {}", capitalize(meal_type))),
        description: parsed
            .description
            .unwrap_or_else(|| "A nutritious and balanced meal.".to_string()),
        ingredients: parsed
            .ingredients
            .unwrap_or_else(|| "Fresh vegetables, lean protein, whole grains".to_string()),
        preparation: parsed
            .preparation
            .unwrap_or_else(|| "Follow standard healthy cooking practices".to_string()),
        calories,
        protein_g: (calories_f * protein_ratio / 4.0).floor(),
        carbs_g: (calories_f * carb_ratio / 4.0).floor(),
        fats_g: (calories_f * fat_ratio / 9.0).floor(),
    }
}

/// One meal through the completion service. Completion failures propagate;
/// only malformed replies fall back.
pub async fn generate_meal(
    completion: &CompletionClient,
    meal_type: &str,
    calories: i32,
    goal: &str,
    preferences: Option<&str>,
    allergies: Option<&str>,
) -> Result<GeneratedMeal> {
    let request = vec![
        completion::system_message(Prompts::MEAL_SYSTEM)?,
        completion::user_message(&Prompts::meal_request(
            meal_type,
            calories,
            goal,
            preferences,
            allergies,
        ))?,
    ];
    let response = completion
        .complete(request, MEAL_TEMPERATURE, MEAL_MAX_TOKENS)
        .await?;

    Ok(parse_meal(meal_type, calories, goal, &response))
}

/// Short personalized analysis of the computed assessment.
pub async fn generate_analysis(
    completion: &CompletionClient,
    bmi: f64,
    bmi_category: &str,
    target_calories: i32,
    goal: &str,
    preferences: Option<&str>,
    allergies: Option<&str>,
) -> Result<String> {
    let request = vec![
        completion::system_message(Prompts::ANALYSIS_SYSTEM)?,
        completion::user_message(&Prompts::analysis_request(
            bmi,
            bmi_category,
            target_calories,
            goal,
            preferences,
            allergies,
        ))?,
    ];
    completion
        .complete(request, MEAL_TEMPERATURE, ANALYSIS_MAX_TOKENS)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_plain_object() {
        let text = r#"{"name": "Oatmeal"}"#;
        assert_eq!(extract_json_object(text), Some(text));
    }

    #[test]
    fn extracts_from_markdown_fences_and_trailing_prose() {
        let text = "```json\n{\"name\": \"Salad\", \"description\": \"Green\"}\n```\nEnjoy your meal!";
        let json = extract_json_object(text).unwrap();
        assert_eq!(json, "{\"name\": \"Salad\", \"description\": \"Green\"}");
    }

    #[test]
    fn handles_nested_objects() {
        let text = "prefix {\"a\": {\"b\": 1}, \"c\": 2} suffix";
        assert_eq!(extract_json_object(text), Some("{\"a\": {\"b\": 1}, \"c\": 2}"));
    }

    #[test]
    fn unbalanced_braces_yield_none() {
        assert_eq!(extract_json_object("{\"name\": \"incomplete\""), None);
        assert_eq!(extract_json_object("no json here"), None);
    }

    #[test]
    fn parse_meal_reads_model_fields() {
        let response = r#"{"name": "Quinoa Bowl", "description": "Light lunch.", "ingredients": "quinoa, chickpeas", "preparation": "Mix and chill."}"#;
        let meal = parse_meal("lunch", 600, "weight_loss", response);
        assert_eq!(meal.name, "Quinoa Bowl");
        assert_eq!(meal.ingredients, "quinoa, chickpeas");
        assert_eq!(meal.calories, 600);
        // 600 * 0.30 / 4
        assert_eq!(meal.protein_g, 45.0);
    }

    #[test]
    fn parse_meal_falls_back_on_garbage() {
        let meal = parse_meal("breakfast", 400, "maintain", "I cannot answer that.");
        assert_eq!(meal.name, "Healthy Breakfast");
        assert_eq!(meal.calories, 400);
        assert!(meal.protein_g > 0.0 && meal.fats_g > 0.0);
    }

    #[test]
    fn meal_macros_track_goal() {
        let gain = parse_meal("dinner", 800, "muscle_gain", "{}");
        let maintain = parse_meal("dinner", 800, "maintain", "{}");
        assert!(gain.protein_g > maintain.protein_g);
    }
}
