use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_CLIENT_ID: &str = "schedule-client";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// A usable request timeout is a positive whole number of seconds.
fn parse_timeout_secs(raw: &str) -> Option<u64> {
    match raw.trim().parse::<u64>() {
        Ok(0) => {
            warn!("REQUEST_TIMEOUT_SECS must be greater than zero, using default");
            None
        }
        Ok(secs) => Some(secs),
        Err(_) => {
            warn!("REQUEST_TIMEOUT_SECS is not a number ({}), using default", raw);
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_base_url: String,
    /// Client whose nested roles are read from `resource_access`.
    pub client_id: String,
    pub request_timeout_secs: u64,
    pub session_dir: PathBuf,
    pub portal_addr: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            session_dir: PathBuf::from(".session"),
            portal_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            api_base_url: env::var("API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| {
                    warn!("API_BASE_URL not set, using default");
                    defaults.api_base_url.clone()
                }),
            client_id: env::var("OIDC_CLIENT_ID")
                .unwrap_or_else(|_| {
                    warn!("OIDC_CLIENT_ID not set, using default");
                    defaults.client_id.clone()
                }),
            request_timeout_secs: match env::var("REQUEST_TIMEOUT_SECS") {
                Ok(raw) => parse_timeout_secs(&raw).unwrap_or(defaults.request_timeout_secs),
                Err(_) => defaults.request_timeout_secs,
            },
            session_dir: env::var("SESSION_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| defaults.session_dir.clone()),
            portal_addr: env::var("PORTAL_ADDR")
                .unwrap_or_else(|_| defaults.portal_addr.clone()),
        };

        if !config.is_configured() {
            warn!("Client not fully configured - API base URL is empty");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.api_base_url.is_empty() && !self.client_id.is_empty()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base_url = base_url.into();
        self
    }
}
