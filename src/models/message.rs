use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction, Type};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "role_enum", rename_all = "lowercase")] // SQL value name
#[serde(rename_all = "lowercase")] // JSON value name
pub enum Role {
    Assistant,
    User,
}

/// A single turn within a conversation. Messages are immutable once created;
/// ordering within a conversation is by `created_at` ascending.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: Role,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Inserts a message row with the current timestamp. Does not bump the
    /// conversation's `updated_at`; callers finish the turn with
    /// [`Conversation::touch`](crate::models::Conversation::touch).
    pub async fn append(
        tx: &mut Transaction<'_, Postgres>,
        conversation_id: Uuid,
        role: Role,
        body: &str,
    ) -> Result<Self> {
        let message = Message {
            id: Uuid::new_v4(),
            conversation_id,
            role,
            body: body.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO messages (id, conversation_id, role, body, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(message.id)
        .bind(message.conversation_id)
        .bind(message.role)
        .bind(&message.body)
        .bind(message.created_at)
        .execute(&mut **tx)
        .await?;

        Ok(message)
    }

    pub async fn list_for_conversation(pool: &PgPool, conversation_id: Uuid) -> Result<Vec<Self>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT * FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(conversation_id)
        .fetch_all(pool)
        .await?;

        Ok(messages)
    }

    pub(crate) async fn count_in(
        tx: &mut Transaction<'_, Postgres>,
        conversation_id: Uuid,
    ) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE conversation_id = $1")
                .bind(conversation_id)
                .fetch_one(&mut **tx)
                .await?;

        Ok(count)
    }

    pub(crate) async fn first_user_body(
        tx: &mut Transaction<'_, Postgres>,
        conversation_id: Uuid,
    ) -> Result<Option<String>> {
        let body: Option<String> = sqlx::query_scalar(
            r#"
            SELECT body FROM messages
            WHERE conversation_id = $1 AND role = 'user'
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(conversation_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(body)
    }
}
