use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
    #[serde(default)]
    pub bmi_category: Option<String>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub conversation_id: Uuid,
    pub conversation_title: String,
    pub conversation_updated_at: DateTime<Utc>,
    pub user_message_id: Uuid,
    pub assistant_message_id: Uuid,
}
