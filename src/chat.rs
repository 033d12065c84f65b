use anyhow::Result;
use async_openai::types::ChatCompletionRequestMessage;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::completion::{self, CompletionClient};
use crate::models::{Conversation, Message, Role};
use crate::prompts::Prompts;

const TURN_TEMPERATURE: f32 = 0.7;
const TURN_MAX_TOKENS: u32 = 512;

/// Everything a completed turn produced. `completion_failed` marks a turn
/// where the assistant text is the stored error placeholder rather than a
/// reply from the completion service.
pub struct TurnOutcome {
    pub conversation: Conversation,
    pub user_message: Message,
    pub assistant_message: Message,
    pub completion_failed: bool,
}

/// Request to the completion service: fixed system instruction, then the
/// optional health-context hint, then the user's text.
pub fn build_turn_messages(
    user_text: &str,
    bmi_category: Option<&str>,
) -> Result<Vec<ChatCompletionRequestMessage>> {
    let mut messages = vec![completion::system_message(Prompts::NUTRITION_SYSTEM)?];
    if let Some(category) = bmi_category.filter(|category| !category.is_empty()) {
        messages.push(completion::system_message(&Prompts::context_hint(category))?);
    }
    messages.push(completion::user_message(user_text)?);
    Ok(messages)
}

/// Runs one chat turn inside a single transaction: resolve-or-create the
/// conversation (taking its row lock, so concurrent turns against the same
/// conversation serialize), append the user message, obtain the assistant
/// reply, append it, and touch the conversation.
///
/// The user message is always persisted. When the completion service fails
/// after its retries, an error-placeholder assistant message is stored in
/// place of a reply and the turn commits anyway; callers surface that state
/// as a service-unavailable condition.
///
/// Callers must reject empty text before calling; nothing is persisted for
/// an empty turn.
pub async fn handle_turn(
    pool: &PgPool,
    completion: &CompletionClient,
    user_id: &str,
    conversation_id: Option<Uuid>,
    user_text: &str,
    bmi_category: Option<&str>,
) -> Result<TurnOutcome> {
    debug_assert!(!user_text.trim().is_empty());
    let user_text = user_text.trim();

    let mut tx = pool.begin().await?;

    let mut conversation =
        Conversation::get_or_create_for_update(&mut tx, user_id, conversation_id, user_text)
            .await?;

    let user_message = Message::append(&mut tx, conversation.id, Role::User, user_text).await?;

    let request = build_turn_messages(user_text, bmi_category)?;
    let (assistant_text, completion_failed) = match completion
        .complete(request, TURN_TEMPERATURE, TURN_MAX_TOKENS)
        .await
    {
        Ok(text) => (text, false),
        Err(e) => {
            warn!(
                "Completion failed for conversation {}: {e:#}",
                conversation.id
            );
            (Prompts::COMPLETION_UNAVAILABLE.to_string(), true)
        }
    };

    let assistant_message =
        Message::append(&mut tx, conversation.id, Role::Assistant, &assistant_text).await?;

    conversation.touch(&mut tx).await?;
    tx.commit().await?;

    debug!(
        "Turn complete for conversation {} (user {}, degraded: {})",
        conversation.id, user_id, completion_failed
    );

    Ok(TurnOutcome {
        conversation,
        user_message,
        assistant_message,
        completion_failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_messages_start_with_system_and_end_with_user() {
        let messages = build_turn_messages("what should I eat?", None).unwrap();
        assert_eq!(messages.len(), 2);
        assert!(matches!(
            messages[0],
            ChatCompletionRequestMessage::System(_)
        ));
        assert!(matches!(
            messages[1],
            ChatCompletionRequestMessage::User(_)
        ));
    }

    #[test]
    fn context_hint_slots_between_system_and_user() {
        let messages = build_turn_messages("hello", Some("Overweight")).unwrap();
        assert_eq!(messages.len(), 3);
        let ChatCompletionRequestMessage::System(hint) = &messages[1] else {
            panic!("expected a system hint message");
        };
        assert!(hint.content.contains("Overweight"));
    }

    #[test]
    fn empty_category_adds_no_hint() {
        let messages = build_turn_messages("hello", Some("")).unwrap();
        assert_eq!(messages.len(), 2);
    }
}
