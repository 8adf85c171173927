use reqwest::StatusCode;
use thiserror::Error;

use shared_models::error::{codes, describe_error, ApiErrorBody};

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Session is no longer valid")]
    Unauthorized,

    #[error("API error ({status}): {}", .body.message.as_deref().unwrap_or("no message"))]
    Api { status: StatusCode, body: ApiErrorBody },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Request cancelled")]
    Cancelled,
}

impl GatewayError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            GatewayError::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            GatewayError::Api { status, .. } => Some(*status),
            GatewayError::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// Application error code; transport failures report the "unreachable" code.
    pub fn app_code(&self) -> Option<i32> {
        match self {
            GatewayError::Api { body, .. } => body.status_code,
            GatewayError::Transport(_) => Some(codes::NETWORK_UNREACHABLE),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, GatewayError::Unauthorized)
    }

    pub fn user_message(&self, fallback: &str) -> String {
        let server_message = match self {
            GatewayError::Api { body, .. } => body.message.as_deref(),
            _ => None,
        };
        describe_error(self.app_code(), server_message, fallback)
    }
}
