pub struct Prompts;

impl Prompts {
    pub const NUTRITION_SYSTEM: &'static str = "You are an expert nutrition and health advisor. Provide evidence-based advice about:\n- Nutrition and diet\n- Exercise and physical activity\n- Health and wellness\n- Weight management\n- Meal planning\nKeep responses concise, practical, and tailored to the user's health context when provided.";

    pub const MEAL_SYSTEM: &'static str = "You are a professional nutritionist. Generate realistic, healthy meal suggestions. Always respond with valid JSON only.";

    pub const ANALYSIS_SYSTEM: &'static str =
        "You are a professional health and nutrition advisor.";

    /// Stored as the assistant turn when the completion service stays
    /// unreachable after retries.
    pub const COMPLETION_UNAVAILABLE: &'static str =
        "Sorry, the nutrition assistant is unavailable right now. Your message has been saved; please try again in a moment.";

    pub fn context_hint(bmi_category: &str) -> String {
        format!("User BMI Category: {bmi_category}")
    }

    pub fn meal_request(
        meal_type: &str,
        calories: i32,
        goal: &str,
        preferences: Option<&str>,
        allergies: Option<&str>,
    ) -> String {
        let mut prompt = format!(
            "Generate ONE {meal_type} meal suggestion with exactly {calories} calories.\nGoal: {goal}\n"
        );
        if let Some(preferences) = preferences.filter(|p| !p.is_empty()) {
            prompt.push_str(&format!("Dietary preferences: {preferences}\n"));
        }
        if let Some(allergies) = allergies.filter(|a| !a.is_empty()) {
            prompt.push_str(&format!("Allergies to AVOID: {allergies}\n"));
        }
        prompt.push_str(
            "\nRespond in JSON format ONLY:\n{\n    \"name\": \"meal name\",\n    \"description\": \"2-3 sentence description\",\n    \"ingredients\": \"comma separated list\",\n    \"preparation\": \"brief cooking instructions\"\n}\n\nMake sure the meal fits the calorie target and respects any allergies.",
        );
        prompt
    }

    pub fn analysis_request(
        bmi: f64,
        bmi_category: &str,
        target_calories: i32,
        goal: &str,
        preferences: Option<&str>,
        allergies: Option<&str>,
    ) -> String {
        let mut prompt = format!(
            "Provide a brief 2-3 sentence health recommendation for someone with:\nBMI: {bmi:.1} ({bmi_category})\nGoal: {goal}\nTarget daily calories: {target_calories}\n"
        );
        if let Some(preferences) = preferences.filter(|p| !p.is_empty()) {
            prompt.push_str(&format!("Preferences: {preferences}\n"));
        }
        if let Some(allergies) = allergies.filter(|a| !a.is_empty()) {
            prompt.push_str(&format!("Allergies: {allergies}\n"));
        }
        prompt.push_str("\nBe specific, personalized, and practical.");
        prompt
    }
}
