use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    pub ai_message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChatRole {
    User,
    #[serde(other)]
    Assistant,
}

/// One stored turn of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiResponse {
    #[serde(default)]
    pub id: Option<i64>,
    pub role: ChatRole,
    pub message: String,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

impl AiResponse {
    pub fn is_from_user(&self) -> bool {
        self.role == ChatRole::User
    }
}
