use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: String, // user_67e55044-10b1-...
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Upserts by email so repeated registrations keep a stable identity.
    pub async fn upsert(
        pool: &PgPool,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Self> {
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, first_name, last_name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (email) DO UPDATE
            SET first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(format!("user_{}", Uuid::new_v4().simple()))
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(now)
        .fetch_one(pool)
        .await?;

        debug!("User upserted: {}", user.id);
        Ok(user)
    }

    pub async fn get_by_id(pool: &PgPool, id: &str) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }
}
