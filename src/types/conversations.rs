use serde::{Deserialize, Serialize};

use crate::models::{Conversation, ConversationSummary, Message};

fn default_limit() -> i64 {
    20
}

#[derive(Deserialize)]
pub struct ListParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Serialize)]
pub struct ConversationListResponse {
    pub conversations: Vec<ConversationSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Serialize)]
pub struct ConversationDetailResponse {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

#[derive(Deserialize)]
pub struct RenameConversationRequest {
    pub title: String,
}

#[derive(Deserialize)]
pub struct PinConversationRequest {
    pub pinned: bool,
}

#[derive(Serialize)]
pub struct DeletedCountResponse {
    pub deleted_count: u64,
}
