use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::health;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub sex: String,
    pub date_of_birth: Option<NaiveDate>,
    pub activity_level: String,
    pub dietary_preferences: String,
    pub food_allergies: String,
    pub health_goals: String,
    pub target_weight_kg: Option<f64>,
    pub target_calories: Option<i32>,
    pub water_goal_liters: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a profile update may set; anything left `None` keeps its stored value.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileChanges {
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub sex: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub activity_level: Option<String>,
    pub dietary_preferences: Option<String>,
    pub food_allergies: Option<String>,
    pub health_goals: Option<String>,
    pub target_weight_kg: Option<f64>,
    pub target_calories: Option<i32>,
    pub water_goal_liters: Option<f64>,
}

impl UserProfile {
    /// Returns the profile, creating an empty one on first access.
    pub async fn get_or_create(pool: &PgPool, user_id: &str) -> Result<Self> {
        if let Some(profile) =
            sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(pool)
                .await?
        {
            return Ok(profile);
        }

        let now = Utc::now();
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO user_profiles (user_id, created_at, updated_at)
            VALUES ($1, $2, $2)
            ON CONFLICT (user_id) DO UPDATE SET updated_at = user_profiles.updated_at
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(profile)
    }

    pub async fn update(pool: &PgPool, user_id: &str, changes: &ProfileChanges) -> Result<Self> {
        let current = Self::get_or_create(pool, user_id).await?;

        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            UPDATE user_profiles
            SET height_cm = $1,
                weight_kg = $2,
                sex = $3,
                date_of_birth = $4,
                activity_level = $5,
                dietary_preferences = $6,
                food_allergies = $7,
                health_goals = $8,
                target_weight_kg = $9,
                target_calories = $10,
                water_goal_liters = $11,
                updated_at = $12
            WHERE user_id = $13
            RETURNING *
            "#,
        )
        .bind(changes.height_cm.or(current.height_cm))
        .bind(changes.weight_kg.or(current.weight_kg))
        .bind(changes.sex.as_deref().unwrap_or(&current.sex))
        .bind(changes.date_of_birth.or(current.date_of_birth))
        .bind(
            changes
                .activity_level
                .as_deref()
                .unwrap_or(&current.activity_level),
        )
        .bind(
            changes
                .dietary_preferences
                .as_deref()
                .unwrap_or(&current.dietary_preferences),
        )
        .bind(
            changes
                .food_allergies
                .as_deref()
                .unwrap_or(&current.food_allergies),
        )
        .bind(
            changes
                .health_goals
                .as_deref()
                .unwrap_or(&current.health_goals),
        )
        .bind(changes.target_weight_kg.or(current.target_weight_kg))
        .bind(changes.target_calories.or(current.target_calories))
        .bind(changes.water_goal_liters.unwrap_or(current.water_goal_liters))
        .bind(Utc::now())
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(profile)
    }

    /// BMI from the stored measurements, when both are present and valid.
    pub fn bmi(&self) -> Option<f64> {
        match (self.height_cm, self.weight_kg) {
            (Some(height), Some(weight)) => health::bmi(height, weight),
            _ => None,
        }
    }

    pub fn bmi_category(&self) -> Option<health::BmiCategory> {
        self.bmi().map(health::BmiCategory::from_bmi)
    }
}
