use serde_json::Value;
use tracing::debug;
use urlencoding::encode;

use shared_gateway::{ApiClient, GatewayError, Method};
use shared_models::api::ApiResponse;

use crate::models::{AiResponse, AskRequest};

pub(crate) const AI_AGENT_PATH: &str = "/ai-agent";

#[derive(Debug, Clone)]
pub struct ChatbotService {
    api: ApiClient,
}

impl ChatbotService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Sends a question; the assistant answers in plain text.
    pub async fn ask(&self, keycloak_id: &str, message: &str) -> Result<String, GatewayError> {
        debug!("Asking assistant on behalf of {}", keycloak_id);
        let body = serde_json::to_value(AskRequest {
            ai_message: message.to_string(),
        })?;
        self.api
            .request_text(
                Method::POST,
                &format!("{}/conversation/ask", AI_AGENT_PATH),
                Some(&[("keycloakId", keycloak_id)]),
                Some(body),
            )
            .await
    }

    pub async fn history(&self, keycloak_id: &str) -> Result<ApiResponse<Vec<AiResponse>>, GatewayError> {
        self.api
            .get_with_query(
                &format!("{}/conversation/history", AI_AGENT_PATH),
                &[("keycloakId", keycloak_id)],
            )
            .await
    }

    pub async fn clear_history(&self, keycloak_id: &str) -> Result<ApiResponse<Option<Value>>, GatewayError> {
        debug!("Clearing conversation for {}", keycloak_id);
        self.api
            .delete(&format!("{}/conversation/{}", AI_AGENT_PATH, encode(keycloak_id)))
            .await
    }
}
