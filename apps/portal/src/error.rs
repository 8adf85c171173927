use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use shared_gateway::GatewayError;

#[derive(Error, Debug)]
pub enum PortalError {
    #[error("Not signed in")]
    Unauthorized,

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("{message}")]
    Upstream { status: StatusCode, message: String },
}

impl PortalError {
    pub fn from_gateway(err: GatewayError, fallback: &str) -> Self {
        if err.is_unauthorized() {
            return PortalError::Unauthorized;
        }
        let status = match &err {
            GatewayError::Api { status, .. } => *status,
            GatewayError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_GATEWAY,
        };
        PortalError::Upstream {
            status,
            message: err.user_message(fallback),
        }
    }
}

impl From<GatewayError> for PortalError {
    fn from(err: GatewayError) -> Self {
        Self::from_gateway(err, "Request failed")
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            PortalError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            PortalError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            PortalError::Upstream { status, message } => (*status, message.clone()),
        };

        tracing::error!("Error: {}: {}", status, message);

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
