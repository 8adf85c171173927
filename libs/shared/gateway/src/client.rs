use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, Response, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, error, warn};

use shared_config::ClientConfig;
use shared_models::error::ApiErrorBody;
use shared_session::SessionStore;

use crate::error::GatewayError;

/// Response header through which the server hands out a replacement token.
pub const ROTATED_TOKEN_HEADER: &str = "x-auth-token";

const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A response carried a new token; it is already stored and mirrored.
    TokenRotated,
    /// The server answered 401; the session has been torn down.
    SessionInvalidated,
}

/// Single path for every call to the scheduling API.
///
/// Each request carries the stored token; responses may rotate it, and a 401
/// clears the session and is announced on the event channel instead of
/// navigating anywhere.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    stream_client: Client,
    base_url: String,
    session: SessionStore,
    events: broadcast::Sender<SessionEvent>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: SessionStore) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        // Streams stay open indefinitely; only connecting is bounded.
        let stream_client = Client::builder()
            .connect_timeout(config.request_timeout())
            .build()?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            client,
            stream_client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            session,
            events,
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request stage: bearer credential plus cookie mirror.
    fn get_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = self.session.get_token() {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                    self.session.mirror_cookie(&token);
                }
                Err(_) => warn!("Stored token is not a valid header value; sending request without it"),
            }
        }

        headers
    }

    async fn send(
        &self,
        client: &Client,
        method: Method,
        path: &str,
        query: Option<&[(&str, &str)]>,
        body: Option<Value>,
    ) -> Result<Response, GatewayError> {
        let url = self.url(path);
        debug!("Making {} request to {}", method, url);

        let mut req = client.request(method, &url).headers(self.get_headers());
        if let Some(query) = query {
            req = req.query(query);
        }
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            self.invalidate_session();
            return Err(GatewayError::Unauthorized);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("API error ({}): {}", status, error_text);
            return Err(GatewayError::Api {
                status,
                body: ApiErrorBody::from_text(&error_text),
            });
        }

        Ok(response)
    }

    fn header_token(response: &Response) -> Option<String> {
        response
            .headers()
            .get(ROTATED_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    }

    fn rotate_token(&self, token: &str) {
        if self.session.get_token().as_deref() == Some(token) {
            return;
        }
        debug!("Server rotated the session token");
        self.session.persist_token(token);
        let _ = self.events.send(SessionEvent::TokenRotated);
    }

    fn invalidate_session(&self) {
        warn!("Received 401 from API, clearing session");
        self.session.logout();
        let _ = self.events.send(SessionEvent::SessionInvalidated);
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, &str)]>,
        body: Option<Value>,
    ) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
    {
        let response = self.send(&self.client, method, path, query, body).await?;
        // A rotated header token is kept even when the body turns out unusable.
        let header_token = Self::header_token(&response);
        if let Some(token) = header_token.as_deref() {
            self.rotate_token(token);
        }

        let bytes = response.bytes().await?;
        let data: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };

        if header_token.is_none() {
            if let Some(token) = data
                .get("token")
                .and_then(Value::as_str)
                .filter(|token| !token.is_empty())
            {
                self.rotate_token(token);
            }
        }

        Ok(serde_json::from_value(data)?)
    }

    /// Same pipeline for endpoints that answer with plain text.
    pub async fn request_text(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, &str)]>,
        body: Option<Value>,
    ) -> Result<String, GatewayError> {
        let response = self.send(&self.client, method, path, query, body).await?;
        if let Some(token) = Self::header_token(&response) {
            self.rotate_token(&token);
        }
        Ok(response.text().await?)
    }

    /// Opens a long-lived event stream; the caller reads the body.
    pub async fn open_stream(&self, path: &str) -> Result<Response, GatewayError> {
        let url = self.url(path);
        debug!("Opening event stream {}", url);

        let mut headers = self.get_headers();
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));

        let response = self.stream_client.get(&url).headers(headers).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            self.invalidate_session();
            return Err(GatewayError::Unauthorized);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Event stream error ({}): {}", status, error_text);
            return Err(GatewayError::Api {
                status,
                body: ApiErrorBody::from_text(&error_text),
            });
        }

        Ok(response)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        self.request(Method::GET, path, None, None).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GatewayError> {
        self.request(Method::GET, path, Some(query), None).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        self.request(Method::POST, path, None, Some(serde_json::to_value(body)?)).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        self.request(Method::PUT, path, None, Some(serde_json::to_value(body)?)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        self.request(Method::DELETE, path, None, None).await
    }

    pub async fn delete_with_body<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        self.request(Method::DELETE, path, None, Some(serde_json::to_value(body)?)).await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .finish()
    }
}
