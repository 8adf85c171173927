use std::time::Duration;

use assert_matches::assert_matches;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_gateway::{ApiClient, GatewayError, RequestScope, SessionEvent, ROTATED_TOKEN_HEADER};
use shared_models::api::ApiResponse;
use shared_session::SessionStore;
use shared_utils::test_utils::{JwtTestUtils, MockApiResponses, TestConfig, TestUser};

const SECRET: &str = "test-secret";

fn create_client(mock_server: &MockServer) -> ApiClient {
    let config = TestConfig::with_base_url(&mock_server.uri()).to_client_config();
    let session = SessionStore::in_memory(&config.client_id);
    ApiClient::new(&config, session).unwrap()
}

fn signed_in(client: &ApiClient) -> String {
    let token = JwtTestUtils::create_test_token(&TestUser::user("alice"), SECRET, None);
    client.session().set_token(&token);
    token
}

#[tokio::test]
async fn test_attaches_bearer_token_and_mirrors_cookie() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server);
    let token = signed_in(&client);

    Mock::given(method("GET"))
        .and(path("/rooms/all"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::envelope(json!([]))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response: ApiResponse<Vec<Value>> = client.get("/rooms/all").await.unwrap();

    assert!(response.data.is_empty());
    assert_eq!(client.session().cookie_token(), Some(token));
}

#[tokio::test]
async fn test_anonymous_request_has_no_authorization() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server);

    Mock::given(method("POST"))
        .and(path("/users/login"))
        .and(body_json(json!({ "username": "alice", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::token_response("t")))
        .mount(&mock_server)
        .await;

    let _: Value = client
        .post("/users/login", &json!({ "username": "alice", "password": "pw" }))
        .await
        .unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
    assert!(client.session().cookie_token().is_none());
}

#[tokio::test]
async fn test_rotated_token_from_header_is_used_next() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server);
    let mut events = client.subscribe();
    signed_in(&client);
    let rotated = JwtTestUtils::create_test_token(&TestUser::user("alice"), SECRET, Some(48));

    Mock::given(method("GET"))
        .and(path("/schedules/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(ROTATED_TOKEN_HEADER, rotated.as_str())
                .set_body_json(MockApiResponses::envelope(json!({ "scheduleId": 1 }))),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/schedules/2"))
        .and(header("authorization", format!("Bearer {}", rotated).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::envelope(json!({ "scheduleId": 2 }))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let _: Value = client.get("/schedules/1").await.unwrap();

    assert_eq!(client.session().get_token().as_deref(), Some(rotated.as_str()));
    assert_eq!(client.session().cookie_token().as_deref(), Some(rotated.as_str()));
    assert_eq!(events.recv().await.unwrap(), SessionEvent::TokenRotated);

    let second: ApiResponse<Value> = client.get("/schedules/2").await.unwrap();
    assert_eq!(second.data["scheduleId"], 2);
}

#[tokio::test]
async fn test_rotated_token_from_body() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server);
    signed_in(&client);

    Mock::given(method("PUT"))
        .and(path("/users/kc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statusCode": 1000,
            "token": "fresh.token.value",
            "data": { "userId": 1 }
        })))
        .mount(&mock_server)
        .await;

    let _: Value = client.put("/users/kc-1", &json!({ "firstname": "A" })).await.unwrap();

    assert_eq!(client.session().get_token().as_deref(), Some("fresh.token.value"));
    assert_eq!(client.session().cookie_token().as_deref(), Some("fresh.token.value"));
}

#[tokio::test]
async fn test_header_token_survives_non_json_body() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server);
    let mut events = client.subscribe();
    client.session().set_token("old.tok.en");

    Mock::given(method("DELETE"))
        .and(path("/rooms/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(ROTATED_TOKEN_HEADER, "new.tok.en")
                .set_body_string("Deleted"),
        )
        .mount(&mock_server)
        .await;

    let err = client.delete::<Value>("/rooms/1").await.unwrap_err();

    assert_matches!(err, GatewayError::Decode(_));
    assert_eq!(client.session().get_token().as_deref(), Some("new.tok.en"));
    assert_eq!(events.recv().await.unwrap(), SessionEvent::TokenRotated);
}

#[tokio::test]
async fn test_same_token_does_not_announce_rotation() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server);
    let mut events = client.subscribe();
    let token = signed_in(&client);

    Mock::given(method("GET"))
        .and(path("/departments/all"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(ROTATED_TOKEN_HEADER, token.as_str())
                .set_body_json(MockApiResponses::envelope(json!([]))),
        )
        .mount(&mock_server)
        .await;

    let _: Value = client.get("/departments/all").await.unwrap();
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_unauthorized_tears_down_session() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server);
    let mut events = client.subscribe();
    let user = TestUser::user("alice");
    signed_in(&client);
    client.session().set_current_user(&user.to_current_user());

    Mock::given(method("GET"))
        .and(path("/users/my-profile"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let result: Result<Value, _> = client.get("/users/my-profile").await;

    assert_matches!(result, Err(GatewayError::Unauthorized));
    assert!(client.session().get_token().is_none());
    assert!(client.session().get_current_user().is_none());
    assert!(client.session().cookie_token().is_none());
    assert_eq!(events.recv().await.unwrap(), SessionEvent::SessionInvalidated);
}

#[tokio::test]
async fn test_other_errors_propagate_with_code() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server);
    let token = signed_in(&client);

    Mock::given(method("PUT"))
        .and(path("/users/7/change-password"))
        .respond_with(ResponseTemplate::new(400).set_body_json(MockApiResponses::error_response(2202, "old password mismatch")))
        .mount(&mock_server)
        .await;

    let err = client
        .put::<Value, _>("/users/7/change-password", &json!({ "oldPassword": "x" }))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    assert_eq!(err.app_code(), Some(2202));
    assert_eq!(err.user_message("Change failed"), "Current password is incorrect");
    // non-401 failures leave the session alone
    assert_eq!(client.session().get_token(), Some(token));
}

#[tokio::test]
async fn test_forbidden_is_not_a_teardown() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server);
    signed_in(&client);

    Mock::given(method("DELETE"))
        .and(path("/rooms/3"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&mock_server)
        .await;

    let err = client.delete::<Value>("/rooms/3").await.unwrap_err();
    assert_matches!(&err, GatewayError::Api { status, .. } if *status == StatusCode::FORBIDDEN);
    assert!(client.session().is_authenticated());
}

#[tokio::test]
async fn test_query_and_text_responses() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server);
    signed_in(&client);

    Mock::given(method("POST"))
        .and(path("/ai-agent/conversation/ask"))
        .and(query_param("keycloakId", "kc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Room A is free at 10:00"))
        .mount(&mock_server)
        .await;

    let reply = client
        .request_text(
            Method::POST,
            "/ai-agent/conversation/ask",
            Some(&[("keycloakId", "kc-1")]),
            Some(json!({ "aiMessage": "Is room A free?" })),
        )
        .await
        .unwrap();

    assert_eq!(reply, "Room A is free at 10:00");
}

#[tokio::test]
async fn test_transport_error_maps_to_unreachable() {
    let config = TestConfig::with_base_url("http://127.0.0.1:1").to_client_config();
    let client = ApiClient::new(&config, SessionStore::in_memory("schedule-client")).unwrap();

    let err = client.get::<Value>("/rooms/all").await.unwrap_err();
    assert_matches!(err, GatewayError::Transport(_));
    assert_eq!(err.app_code(), Some(0));
}

#[tokio::test]
async fn test_scope_cancels_in_flight_request() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server);

    Mock::given(method("GET"))
        .and(path("/rooms/with-status"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)).set_body_json(json!({})))
        .mount(&mock_server)
        .await;

    let scope = RequestScope::new();
    let request_client = client.clone();
    let task = tokio::spawn(scope.run(async move {
        request_client.get::<Value>("/rooms/with-status").await
    }));

    tokio::time::sleep(Duration::from_millis(50)).await;
    drop(scope);

    assert_matches!(task.await.unwrap(), Err(GatewayError::Cancelled));
}
