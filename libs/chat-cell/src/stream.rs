use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use urlencoding::encode;

use shared_gateway::ApiClient;

use crate::services::AI_AGENT_PATH;
use crate::sse::SseDecoder;

/// SSE event name carrying assistant text.
pub const AI_MESSAGE_EVENT: &str = "ai-message";

const MESSAGE_BUFFER: usize = 32;

struct ChatConnection {
    keycloak_id: String,
    task: JoinHandle<()>,
}

impl Drop for ChatConnection {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Live assistant messages for the signed-in user.
///
/// Holds at most one connection. Following another user replaces it, and
/// dropping the stream closes it. A failed connection stays closed until
/// `close` is called and the user is followed again.
pub struct ChatStream {
    api: ApiClient,
    connection: Option<ChatConnection>,
}

impl ChatStream {
    pub fn new(api: ApiClient) -> Self {
        Self { api, connection: None }
    }

    /// Connects for `keycloak_id` and returns the message receiver.
    ///
    /// Returns `None` when already following that user, or when the id is
    /// empty (which also closes any open connection).
    pub fn follow(&mut self, keycloak_id: &str) -> Option<mpsc::Receiver<String>> {
        if keycloak_id.is_empty() {
            self.close();
            return None;
        }
        if self.current_user() == Some(keycloak_id) {
            return None;
        }

        self.close();
        info!("Opening chat stream for {}", keycloak_id);

        let (sender, receiver) = mpsc::channel(MESSAGE_BUFFER);
        let task = tokio::spawn(pump(self.api.clone(), keycloak_id.to_string(), sender));
        self.connection = Some(ChatConnection {
            keycloak_id: keycloak_id.to_string(),
            task,
        });
        Some(receiver)
    }

    pub fn current_user(&self) -> Option<&str> {
        self.connection
            .as_ref()
            .map(|connection| connection.keycloak_id.as_str())
    }

    pub fn is_connected(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(|connection| !connection.task.is_finished())
    }

    pub fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            debug!("Closing chat stream for {}", connection.keycloak_id);
        }
    }
}

async fn pump(api: ApiClient, keycloak_id: String, sender: mpsc::Sender<String>) {
    let path = format!("{}/sse/connect/{}", AI_AGENT_PATH, encode(&keycloak_id));
    let response = match api.open_stream(&path).await {
        Ok(response) => response,
        Err(e) => {
            error!("Chat stream for {} could not connect: {}", keycloak_id, e);
            return;
        }
    };

    let mut body = response.bytes_stream();
    let mut decoder = SseDecoder::new();
    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                error!("Chat stream for {} failed: {}", keycloak_id, e);
                return;
            }
        };

        let events = match decoder.feed(&chunk) {
            Ok(events) => events,
            Err(e) => {
                error!("Closing chat stream for {}: {}", keycloak_id, e);
                return;
            }
        };
        for event in events {
            if event.event != AI_MESSAGE_EVENT {
                continue;
            }
            if sender.send(event.data).await.is_err() {
                debug!("Chat receiver for {} dropped", keycloak_id);
                return;
            }
        }
    }
    debug!("Chat stream for {} ended", keycloak_id);
}
