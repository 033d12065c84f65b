use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Daily progress log; one row per (user, date), later submissions for the
/// same day replace the earlier ones field by field.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub id: Uuid,
    pub user_id: String,
    pub entry_date: NaiveDate,
    pub weight_kg: Option<f64>,
    pub bmi: Option<f64>,
    pub calories_consumed: Option<i32>,
    pub water_liters: Option<f64>,
    pub steps: Option<i32>,
    pub workout_minutes: Option<i32>,
    pub mood_level: Option<i32>,
    pub energy_level: Option<i32>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl ProgressEntry {
    pub async fn upsert(pool: &PgPool, entry: &Self) -> Result<Self> {
        let stored = sqlx::query_as::<_, ProgressEntry>(
            r#"
            INSERT INTO progress_entries
                (id, user_id, entry_date, weight_kg, bmi, calories_consumed, water_liters,
                 steps, workout_minutes, mood_level, energy_level, notes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (user_id, entry_date) DO UPDATE
            SET weight_kg = COALESCE(EXCLUDED.weight_kg, progress_entries.weight_kg),
                bmi = COALESCE(EXCLUDED.bmi, progress_entries.bmi),
                calories_consumed = COALESCE(EXCLUDED.calories_consumed, progress_entries.calories_consumed),
                water_liters = COALESCE(EXCLUDED.water_liters, progress_entries.water_liters),
                steps = COALESCE(EXCLUDED.steps, progress_entries.steps),
                workout_minutes = COALESCE(EXCLUDED.workout_minutes, progress_entries.workout_minutes),
                mood_level = COALESCE(EXCLUDED.mood_level, progress_entries.mood_level),
                energy_level = COALESCE(EXCLUDED.energy_level, progress_entries.energy_level),
                notes = CASE WHEN EXCLUDED.notes = '' THEN progress_entries.notes ELSE EXCLUDED.notes END
            RETURNING *
            "#,
        )
        .bind(entry.id)
        .bind(&entry.user_id)
        .bind(entry.entry_date)
        .bind(entry.weight_kg)
        .bind(entry.bmi)
        .bind(entry.calories_consumed)
        .bind(entry.water_liters)
        .bind(entry.steps)
        .bind(entry.workout_minutes)
        .bind(entry.mood_level)
        .bind(entry.energy_level)
        .bind(&entry.notes)
        .bind(entry.created_at)
        .fetch_one(pool)
        .await?;

        Ok(stored)
    }

    pub async fn list_for_owner(pool: &PgPool, user_id: &str, limit: i64) -> Result<Vec<Self>> {
        let entries = sqlx::query_as::<_, ProgressEntry>(
            r#"
            SELECT * FROM progress_entries
            WHERE user_id = $1
            ORDER BY entry_date DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(entries)
    }
}
