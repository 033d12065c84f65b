use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::models::message::{Message, Role};

/// Display limit for auto-derived titles.
pub const TITLE_MAX_CHARS: usize = 50;
/// Display limit for the sidebar preview of the latest message.
pub const PREVIEW_MAX_CHARS: usize = 200;

/// Char-safe truncation with an ellipsis marker beyond `limit`.
pub fn truncate_with_ellipsis(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(limit).collect();
        format!("{truncated}...")
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub pinned: bool,
    pub last_read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of the conversation list: the conversation plus derived annotations.
/// The unread count is recomputed on every fetch, never stored.
#[derive(Debug, FromRow, Serialize)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub title: String,
    pub pinned: bool,
    pub updated_at: DateTime<Utc>,
    pub message_count: i64,
    pub unread_count: i64,
    pub last_message: Option<String>,
    pub last_message_role: Option<Role>,
    pub last_message_at: Option<DateTime<Utc>>,
}

impl Conversation {
    /// Resolves `candidate_id` to a conversation owned by `user_id`, taking an
    /// exclusive row lock for the rest of the transaction so concurrent turns
    /// against the same conversation serialize. Falls through to creating a
    /// fresh conversation titled from `seed_title` when the id is absent or
    /// belongs to someone else.
    pub async fn get_or_create_for_update(
        tx: &mut Transaction<'_, Postgres>,
        user_id: &str,
        candidate_id: Option<Uuid>,
        seed_title: &str,
    ) -> Result<Self> {
        if let Some(candidate_id) = candidate_id {
            if let Some(conversation) = sqlx::query_as::<_, Conversation>(
                r#"
                SELECT * FROM conversations
                WHERE id = $1 AND user_id = $2
                FOR UPDATE
                "#,
            )
            .bind(candidate_id)
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await?
            {
                debug!("Conversation found: {}", conversation.id);
                return Ok(conversation);
            }
        }

        let now = Utc::now();
        let conversation = sqlx::query_as::<_, Conversation>(
            r#"
            INSERT INTO conversations (id, user_id, title, pinned, created_at, updated_at)
            VALUES ($1, $2, $3, FALSE, $4, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(truncate_with_ellipsis(seed_title, TITLE_MAX_CHARS))
        .bind(now)
        .fetch_one(&mut **tx)
        .await?;

        debug!("Conversation created: {}", conversation.id);
        Ok(conversation)
    }

    /// Bumps `updated_at` and, while the conversation still holds at most two
    /// messages (the first exchange), re-derives the title from the first user
    /// message.
    pub async fn touch(&mut self, tx: &mut Transaction<'_, Postgres>) -> Result<()> {
        if Message::count_in(tx, self.id).await? <= 2 {
            if let Some(first_body) = Message::first_user_body(tx, self.id).await? {
                self.title = truncate_with_ellipsis(&first_body, TITLE_MAX_CHARS);
            }
        }
        self.updated_at = Utc::now();

        sqlx::query("UPDATE conversations SET title = $1, updated_at = $2 WHERE id = $3")
            .bind(&self.title)
            .bind(self.updated_at)
            .bind(self.id)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Owner-scoped fetch; a foreign conversation is indistinguishable from an
    /// absent one.
    pub async fn get_owned(pool: &PgPool, id: Uuid, user_id: &str) -> Result<Option<Self>> {
        let conversation = sqlx::query_as::<_, Conversation>(
            "SELECT * FROM conversations WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(conversation)
    }

    /// Conversations for one owner: pinned first, then by the most recent of
    /// (last message timestamp, `updated_at`) descending, each annotated with
    /// derived unread count and a preview of the latest message.
    pub async fn list_for_owner(
        pool: &PgPool,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ConversationSummary>> {
        let mut summaries = sqlx::query_as::<_, ConversationSummary>(
            r#"
            SELECT c.id,
                   c.title,
                   c.pinned,
                   c.updated_at,
                   (SELECT COUNT(*) FROM messages m
                     WHERE m.conversation_id = c.id) AS message_count,
                   (SELECT COUNT(*) FROM messages m
                     WHERE m.conversation_id = c.id
                       AND (c.last_read_at IS NULL OR m.created_at > c.last_read_at)) AS unread_count,
                   (SELECT m.body FROM messages m
                     WHERE m.conversation_id = c.id
                     ORDER BY m.created_at DESC LIMIT 1) AS last_message,
                   (SELECT m.role FROM messages m
                     WHERE m.conversation_id = c.id
                     ORDER BY m.created_at DESC LIMIT 1) AS last_message_role,
                   (SELECT MAX(m.created_at) FROM messages m
                     WHERE m.conversation_id = c.id) AS last_message_at
            FROM conversations c
            WHERE c.user_id = $1
            ORDER BY c.pinned DESC,
                     GREATEST(c.updated_at,
                              COALESCE((SELECT MAX(m.created_at) FROM messages m
                                         WHERE m.conversation_id = c.id),
                                       c.updated_at)) DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        for summary in &mut summaries {
            summary.last_message = summary
                .last_message
                .as_deref()
                .map(|body| truncate_with_ellipsis(body, PREVIEW_MAX_CHARS));
        }

        Ok(summaries)
    }

    pub async fn count_for_owner(pool: &PgPool, user_id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM conversations WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Sets `last_read_at` to now; the unread count derived from it drops to
    /// zero until the next append. Returns the stored timestamp, or `None`
    /// when the conversation is not owned by `user_id`.
    pub async fn mark_read(
        pool: &PgPool,
        id: Uuid,
        user_id: &str,
    ) -> Result<Option<DateTime<Utc>>> {
        let read_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            UPDATE conversations
            SET last_read_at = $1
            WHERE id = $2 AND user_id = $3
            RETURNING last_read_at
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(read_at)
    }

    pub async fn rename(pool: &PgPool, id: Uuid, user_id: &str, title: &str) -> Result<Option<Self>> {
        let conversation = sqlx::query_as::<_, Conversation>(
            r#"
            UPDATE conversations
            SET title = $1, updated_at = $2
            WHERE id = $3 AND user_id = $4
            RETURNING *
            "#,
        )
        .bind(title)
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(conversation)
    }

    pub async fn set_pinned(
        pool: &PgPool,
        id: Uuid,
        user_id: &str,
        pinned: bool,
    ) -> Result<Option<Self>> {
        let conversation = sqlx::query_as::<_, Conversation>(
            r#"
            UPDATE conversations
            SET pinned = $1
            WHERE id = $2 AND user_id = $3
            RETURNING *
            "#,
        )
        .bind(pinned)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(conversation)
    }

    /// Deletes the conversation; messages go with it via the cascade.
    pub async fn delete(pool: &PgPool, id: Uuid, user_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM conversations WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        debug!("Conversation deleted: {id}");
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_all_for_owner(pool: &PgPool, user_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM conversations WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_with_ellipsis("hello", TITLE_MAX_CHARS), "hello");
        let exactly = "x".repeat(TITLE_MAX_CHARS);
        assert_eq!(truncate_with_ellipsis(&exactly, TITLE_MAX_CHARS), exactly);
    }

    #[test]
    fn long_text_gets_ellipsis_marker() {
        let long = "y".repeat(TITLE_MAX_CHARS + 1);
        let derived = truncate_with_ellipsis(&long, TITLE_MAX_CHARS);
        assert_eq!(derived.chars().count(), TITLE_MAX_CHARS + 3);
        assert!(derived.ends_with("..."));
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        let long = "é".repeat(PREVIEW_MAX_CHARS + 10);
        let preview = truncate_with_ellipsis(&long, PREVIEW_MAX_CHARS);
        assert_eq!(preview.chars().count(), PREVIEW_MAX_CHARS + 3);
    }

    #[sqlx::test]
    async fn unread_count_follows_last_read(pool: PgPool) -> Result<()> {
        let mut tx = pool.begin().await?;
        let conversation =
            Conversation::get_or_create_for_update(&mut tx, "user_a", None, "first question")
                .await?;
        Message::append(&mut tx, conversation.id, Role::User, "first question").await?;
        Message::append(&mut tx, conversation.id, Role::Assistant, "an answer").await?;
        Message::append(&mut tx, conversation.id, Role::User, "a follow-up").await?;
        tx.commit().await?;

        // nothing read yet, so every message counts as unread
        let summaries = Conversation::list_for_owner(&pool, "user_a", 20, 0).await?;
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].message_count, 3);
        assert_eq!(summaries[0].unread_count, 3);

        let read_at = Conversation::mark_read(&pool, conversation.id, "user_a").await?;
        assert!(read_at.is_some());

        // the returned timestamp is the one the row stores
        let stored = Conversation::get_owned(&pool, conversation.id, "user_a")
            .await?
            .ok_or_else(|| anyhow::anyhow!("conversation vanished"))?;
        assert_eq!(stored.last_read_at, read_at);

        let summaries = Conversation::list_for_owner(&pool, "user_a", 20, 0).await?;
        assert_eq!(summaries[0].unread_count, 0);
        Ok(())
    }

    #[sqlx::test]
    async fn pinned_conversations_sort_first(pool: PgPool) -> Result<()> {
        let mut tx = pool.begin().await?;
        let older =
            Conversation::get_or_create_for_update(&mut tx, "user_a", None, "older thread").await?;
        tx.commit().await?;

        let mut tx = pool.begin().await?;
        Conversation::get_or_create_for_update(&mut tx, "user_a", None, "newer thread").await?;
        tx.commit().await?;

        // pinning the stale conversation moves it ahead of the fresher one
        Conversation::set_pinned(&pool, older.id, "user_a", true).await?;

        let summaries = Conversation::list_for_owner(&pool, "user_a", 20, 0).await?;
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].id, older.id);
        assert!(summaries[0].pinned);
        Ok(())
    }

    #[sqlx::test]
    async fn get_or_create_resolves_same_id_to_same_conversation(pool: PgPool) -> Result<()> {
        let mut tx = pool.begin().await?;
        let created =
            Conversation::get_or_create_for_update(&mut tx, "user_a", None, "seed title").await?;
        tx.commit().await?;

        for _ in 0..2 {
            let mut tx = pool.begin().await?;
            let resolved = Conversation::get_or_create_for_update(
                &mut tx,
                "user_a",
                Some(created.id),
                "different seed",
            )
            .await?;
            tx.commit().await?;
            assert_eq!(resolved.id, created.id);
            assert_eq!(resolved.title, created.title);
        }

        // someone else's id falls through to a fresh conversation
        let mut tx = pool.begin().await?;
        let foreign = Conversation::get_or_create_for_update(
            &mut tx,
            "user_b",
            Some(created.id),
            "their own thread",
        )
        .await?;
        tx.commit().await?;
        assert_ne!(foreign.id, created.id);
        assert_eq!(foreign.user_id, "user_b");
        Ok(())
    }

    #[sqlx::test]
    async fn delete_cascades_to_messages(pool: PgPool) -> Result<()> {
        let mut tx = pool.begin().await?;
        let conversation =
            Conversation::get_or_create_for_update(&mut tx, "user_a", None, "doomed thread")
                .await?;
        Message::append(&mut tx, conversation.id, Role::User, "hello").await?;
        Message::append(&mut tx, conversation.id, Role::Assistant, "hi").await?;
        tx.commit().await?;

        assert!(Conversation::delete(&pool, conversation.id, "user_a").await?);

        let orphans: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE conversation_id = $1")
                .bind(conversation.id)
                .fetch_one(&pool)
                .await?;
        assert_eq!(orphans, 0);
        Ok(())
    }
}
