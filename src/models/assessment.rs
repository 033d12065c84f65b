use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

/// A point-in-time health assessment with its computed metrics. Rows are
/// immutable; history is the set of rows ordered newest first.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct HealthAssessment {
    pub id: Uuid,
    pub user_id: String,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub age: Option<i32>,
    pub sex: String,
    pub activity_level: String,
    pub health_goal: String,
    pub bmi: f64,
    pub bmi_category: String,
    pub bmr: i32,
    pub maintenance_calories: i32,
    pub target_calories: i32,
    pub dietary_preferences: String,
    pub food_allergies: String,
    pub analysis: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MealSuggestion {
    pub id: Uuid,
    pub assessment_id: Uuid,
    pub meal_type: String,
    pub name: String,
    pub description: String,
    pub calories: i32,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fats_g: f64,
    pub ingredients: String,
    pub preparation: String,
}

impl HealthAssessment {
    #[allow(clippy::too_many_arguments)]
    pub async fn create(tx: &mut Transaction<'_, Postgres>, assessment: &Self) -> Result<Self> {
        let stored = sqlx::query_as::<_, HealthAssessment>(
            r#"
            INSERT INTO health_assessments
                (id, user_id, height_cm, weight_kg, age, sex, activity_level, health_goal,
                 bmi, bmi_category, bmr, maintenance_calories, target_calories,
                 dietary_preferences, food_allergies, analysis, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING *
            "#,
        )
        .bind(assessment.id)
        .bind(&assessment.user_id)
        .bind(assessment.height_cm)
        .bind(assessment.weight_kg)
        .bind(assessment.age)
        .bind(&assessment.sex)
        .bind(&assessment.activity_level)
        .bind(&assessment.health_goal)
        .bind(assessment.bmi)
        .bind(&assessment.bmi_category)
        .bind(assessment.bmr)
        .bind(assessment.maintenance_calories)
        .bind(assessment.target_calories)
        .bind(&assessment.dietary_preferences)
        .bind(&assessment.food_allergies)
        .bind(&assessment.analysis)
        .bind(assessment.created_at)
        .fetch_one(&mut **tx)
        .await?;

        debug!("Health assessment saved: {}", stored.id);
        Ok(stored)
    }

    pub async fn list_for_owner(pool: &PgPool, user_id: &str) -> Result<Vec<Self>> {
        let assessments = sqlx::query_as::<_, HealthAssessment>(
            r#"
            SELECT * FROM health_assessments
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(assessments)
    }

    pub async fn get_owned(pool: &PgPool, id: Uuid, user_id: &str) -> Result<Option<Self>> {
        let assessment = sqlx::query_as::<_, HealthAssessment>(
            "SELECT * FROM health_assessments WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(assessment)
    }
}

impl MealSuggestion {
    pub async fn create(tx: &mut Transaction<'_, Postgres>, meal: &Self) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO meal_suggestions
                (id, assessment_id, meal_type, name, description, calories,
                 protein_g, carbs_g, fats_g, ingredients, preparation)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(meal.id)
        .bind(meal.assessment_id)
        .bind(&meal.meal_type)
        .bind(&meal.name)
        .bind(&meal.description)
        .bind(meal.calories)
        .bind(meal.protein_g)
        .bind(meal.carbs_g)
        .bind(meal.fats_g)
        .bind(&meal.ingredients)
        .bind(&meal.preparation)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub async fn list_for_assessment(pool: &PgPool, assessment_id: Uuid) -> Result<Vec<Self>> {
        let meals = sqlx::query_as::<_, MealSuggestion>(
            r#"
            SELECT * FROM meal_suggestions
            WHERE assessment_id = $1
            ORDER BY meal_type
            "#,
        )
        .bind(assessment_id)
        .fetch_all(pool)
        .await?;

        Ok(meals)
    }
}
