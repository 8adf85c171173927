use shared_gateway::{ApiClient, GatewayError};
use shared_session::QueryCache;

use crate::models::AiResponse;
use crate::services::ChatbotService;

pub const CHAT_HISTORY_KEY: [&str; 2] = ["chatbot", "history"];

/// Cached conversation access for the chat panel.
#[derive(Debug, Clone)]
pub struct ChatHooks {
    chatbot: ChatbotService,
    cache: QueryCache,
}

impl ChatHooks {
    pub fn new(api: ApiClient, cache: QueryCache) -> Self {
        Self {
            chatbot: ChatbotService::new(api),
            cache,
        }
    }

    pub async fn history(&self, keycloak_id: &str) -> Result<Vec<AiResponse>, GatewayError> {
        if keycloak_id.is_empty() {
            return Ok(Vec::new());
        }

        let key = [CHAT_HISTORY_KEY[0], CHAT_HISTORY_KEY[1], keycloak_id];
        if let Some(cached) = self.cache.get::<Vec<AiResponse>>(&key) {
            return Ok(cached);
        }
        let turns = self.chatbot.history(keycloak_id).await?.into_data();
        self.cache.set(&key, &turns);
        Ok(turns)
    }

    pub async fn ask(&self, keycloak_id: &str, message: &str) -> Result<String, GatewayError> {
        self.chatbot.ask(keycloak_id, message).await
    }

    /// Clears the server-side conversation and every cached history.
    pub async fn clear_history(&self, keycloak_id: &str) -> Result<(), GatewayError> {
        self.chatbot.clear_history(keycloak_id).await?;
        self.cache.invalidate(&CHAT_HISTORY_KEY);
        Ok(())
    }
}
