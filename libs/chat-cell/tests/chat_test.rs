use std::time::Duration;

use serde_json::json;
use tokio::time::timeout;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chat_cell::{ChatHooks, ChatStream, ChatbotService, CHAT_HISTORY_KEY, MAX_LINE_BYTES};
use shared_gateway::{ApiClient, SessionEvent};
use shared_session::{QueryCache, SessionStore};
use shared_utils::test_utils::{JwtTestUtils, MockApiResponses, TestConfig, TestUser};

fn signed_in_client(mock_server: &MockServer) -> ApiClient {
    let config = TestConfig::with_base_url(&mock_server.uri()).to_client_config();
    let api = ApiClient::new(&config, SessionStore::in_memory(&config.client_id)).unwrap();
    let token = JwtTestUtils::create_test_token(&TestUser::user("alice"), "test-secret", None);
    api.session().set_token(&token);
    api
}

fn sse_body(events: &[(&str, &str)]) -> String {
    events
        .iter()
        .map(|(name, data)| format!("event: {}\ndata: {}\n\n", name, data))
        .collect()
}

async fn mount_stream(mock_server: &MockServer, keycloak_id: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/ai-agent/sse/connect/{}", keycloak_id)))
        .and(header("accept", "text/event-stream"))
        .respond_with(template)
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_ask_returns_plain_text() {
    let mock_server = MockServer::start().await;
    let chatbot = ChatbotService::new(signed_in_client(&mock_server));

    Mock::given(method("POST"))
        .and(path("/ai-agent/conversation/ask"))
        .and(query_param("keycloakId", "kc-1"))
        .and(body_json(json!({ "aiMessage": "Book room A at 10" })))
        .respond_with(ResponseTemplate::new(200).set_body_string("Booked room A at 10:00"))
        .mount(&mock_server)
        .await;

    let reply = chatbot.ask("kc-1", "Book room A at 10").await.unwrap();
    assert_eq!(reply, "Booked room A at 10:00");
}

#[tokio::test]
async fn test_history_is_cached_until_cleared() {
    let mock_server = MockServer::start().await;
    let cache = QueryCache::new();
    let hooks = ChatHooks::new(signed_in_client(&mock_server), cache.clone());

    Mock::given(method("GET"))
        .and(path("/ai-agent/conversation/history"))
        .and(query_param("keycloakId", "kc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::envelope(json!([
            { "id": 1, "role": "USER", "message": "hi" },
            { "id": 2, "role": "AI", "message": "hello" }
        ]))))
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/ai-agent/conversation/kc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::envelope(json!("cleared"))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let turns = hooks.history("kc-1").await.unwrap();
    assert_eq!(turns.len(), 2);
    assert!(turns[0].is_from_user());
    assert_eq!(hooks.history("kc-1").await.unwrap(), turns);

    hooks.clear_history("kc-1").await.unwrap();
    assert!(!cache.contains(&[CHAT_HISTORY_KEY[0], CHAT_HISTORY_KEY[1], "kc-1"]));
    hooks.history("kc-1").await.unwrap();
}

#[tokio::test]
async fn test_history_without_user_is_empty() {
    let mock_server = MockServer::start().await;
    let hooks = ChatHooks::new(signed_in_client(&mock_server), QueryCache::new());

    assert!(hooks.history("").await.unwrap().is_empty());
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_stream_forwards_only_ai_messages() {
    let mock_server = MockServer::start().await;
    let body = sse_body(&[("ai-message", "first"), ("heartbeat", "ignored"), ("ai-message", "second")]);
    mount_stream(
        &mock_server,
        "kc-1",
        ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"),
    )
    .await;

    let mut stream = ChatStream::new(signed_in_client(&mock_server));
    let mut messages = stream.follow("kc-1").unwrap();

    let first = timeout(Duration::from_secs(5), messages.recv()).await.unwrap();
    let second = timeout(Duration::from_secs(5), messages.recv()).await.unwrap();
    assert_eq!(first.as_deref(), Some("first"));
    assert_eq!(second.as_deref(), Some("second"));

    // server closed the body, no reconnect
    assert_eq!(timeout(Duration::from_secs(5), messages.recv()).await.unwrap(), None);
    assert_eq!(stream.current_user(), Some("kc-1"));
    assert!(stream.follow("kc-1").is_none());
}

#[tokio::test]
async fn test_oversized_line_closes_stream() {
    let mock_server = MockServer::start().await;
    let body = format!(
        "event: ai-message\ndata: {}\n\n{}",
        "x".repeat(MAX_LINE_BYTES + 1),
        sse_body(&[("ai-message", "after")])
    );
    mount_stream(
        &mock_server,
        "kc-1",
        ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"),
    )
    .await;

    let mut stream = ChatStream::new(signed_in_client(&mock_server));
    let mut messages = stream.follow("kc-1").unwrap();

    assert_eq!(timeout(Duration::from_secs(5), messages.recv()).await.unwrap(), None);
}

#[tokio::test]
async fn test_following_same_user_keeps_connection() {
    let mock_server = MockServer::start().await;
    mount_stream(
        &mock_server,
        "kc-1",
        ResponseTemplate::new(200)
            .set_delay(Duration::from_secs(30))
            .set_body_raw("", "text/event-stream"),
    )
    .await;

    let mut stream = ChatStream::new(signed_in_client(&mock_server));
    assert!(stream.follow("kc-1").is_some());
    assert!(stream.follow("kc-1").is_none());
    assert!(stream.is_connected());
}

#[tokio::test]
async fn test_switching_user_closes_previous_connection() {
    let mock_server = MockServer::start().await;
    mount_stream(
        &mock_server,
        "kc-1",
        ResponseTemplate::new(200)
            .set_delay(Duration::from_secs(30))
            .set_body_raw("", "text/event-stream"),
    )
    .await;
    mount_stream(
        &mock_server,
        "kc-2",
        ResponseTemplate::new(200).set_body_raw(sse_body(&[("ai-message", "for bob")]), "text/event-stream"),
    )
    .await;

    let mut stream = ChatStream::new(signed_in_client(&mock_server));
    let mut alice = stream.follow("kc-1").unwrap();
    let mut bob = stream.follow("kc-2").unwrap();

    assert_eq!(timeout(Duration::from_secs(5), alice.recv()).await.unwrap(), None);
    assert_eq!(
        timeout(Duration::from_secs(5), bob.recv()).await.unwrap().as_deref(),
        Some("for bob")
    );
    assert_eq!(stream.current_user(), Some("kc-2"));
}

#[tokio::test]
async fn test_dropping_stream_closes_connection() {
    let mock_server = MockServer::start().await;
    mount_stream(
        &mock_server,
        "kc-1",
        ResponseTemplate::new(200)
            .set_delay(Duration::from_secs(30))
            .set_body_raw("", "text/event-stream"),
    )
    .await;

    let mut stream = ChatStream::new(signed_in_client(&mock_server));
    let mut messages = stream.follow("kc-1").unwrap();
    drop(stream);

    assert_eq!(timeout(Duration::from_secs(5), messages.recv()).await.unwrap(), None);
}

#[tokio::test]
async fn test_empty_user_closes_stream() {
    let mock_server = MockServer::start().await;
    mount_stream(
        &mock_server,
        "kc-1",
        ResponseTemplate::new(200)
            .set_delay(Duration::from_secs(30))
            .set_body_raw("", "text/event-stream"),
    )
    .await;

    let mut stream = ChatStream::new(signed_in_client(&mock_server));
    let mut messages = stream.follow("kc-1").unwrap();

    assert!(stream.follow("").is_none());
    assert!(stream.current_user().is_none());
    assert_eq!(timeout(Duration::from_secs(5), messages.recv()).await.unwrap(), None);
}

#[tokio::test]
async fn test_unauthorized_stream_tears_down_session() {
    let mock_server = MockServer::start().await;
    mount_stream(&mock_server, "kc-1", ResponseTemplate::new(401)).await;

    let api = signed_in_client(&mock_server);
    let mut events = api.subscribe();
    let mut stream = ChatStream::new(api.clone());
    let mut messages = stream.follow("kc-1").unwrap();

    assert_eq!(timeout(Duration::from_secs(5), messages.recv()).await.unwrap(), None);
    assert_eq!(events.recv().await.unwrap(), SessionEvent::SessionInvalidated);
    assert!(api.session().get_token().is_none());
}
