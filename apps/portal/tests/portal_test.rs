use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_cell::Navigator;
use schedule_portal::{create_router, PortalState};
use shared_session::SessionStore;
use shared_utils::test_utils::{JwtTestUtils, MockApiResponses, TestConfig, TestUser};

const SECRET: &str = "test-secret";

fn portal(mock_server: &MockServer) -> PortalState {
    let config = TestConfig::with_base_url(&mock_server.uri()).to_client_config();
    let store = SessionStore::in_memory(&config.client_id);
    PortalState::new(config, store).unwrap()
}

/// Signs `user` in on both sides: the browser cookie and the portal session.
fn sign_in(state: &PortalState, user: &TestUser) -> String {
    let token = JwtTestUtils::create_test_token(user, SECRET, None);
    state.api.session().persist_token(&token);
    token
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("access_token={}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(state: &PortalState, request: Request<Body>) -> Response {
    create_router(state.clone()).oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(response: &Response) -> Option<&str> {
    response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok())
}

fn set_cookie(response: &Response) -> Option<&str> {
    response.headers().get(header::SET_COOKIE).and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn test_landing_routes_by_role() {
    let mock_server = MockServer::start().await;
    let state = portal(&mock_server);

    let anonymous = send(&state, request("GET", "/", None, None)).await;
    assert_eq!(anonymous.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&anonymous), Some("/login"));

    for (user, expected) in [
        (TestUser::admin("root"), "/admin"),
        (TestUser::manager("mgr"), "/manager"),
        (TestUser::user("alice"), "/user"),
    ] {
        let token = JwtTestUtils::create_test_token(&user, SECRET, None);
        let response = send(&state, request("GET", "/", Some(&token), None)).await;
        assert_eq!(location(&response), Some(expected));
    }

    let corrupt = send(&state, request("GET", "/", Some("garbage"), None)).await;
    assert_eq!(location(&corrupt), Some("/login"));
}

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let mock_server = MockServer::start().await;
    let state = portal(&mock_server);
    let user = TestUser::manager("mgr");
    let token = JwtTestUtils::create_test_token(&user, SECRET, None);

    Mock::given(method("POST"))
        .and(path("/users/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::token_response(&token)))
        .mount(&mock_server)
        .await;

    let response = send(
        &state,
        request("POST", "/login", None, Some(json!({ "username": "mgr", "password": "pw" }))),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        set_cookie(&response),
        Some(format!("access_token={}; Path=/; SameSite=Strict", token).as_str())
    );
    let body = json_body(response).await;
    assert_eq!(body["username"], "mgr");
    assert_eq!(state.api.session().get_token(), Some(token));
}

#[tokio::test]
async fn test_login_failure_reports_message() {
    let mock_server = MockServer::start().await;
    let state = portal(&mock_server);

    Mock::given(method("POST"))
        .and(path("/users/login"))
        .respond_with(ResponseTemplate::new(400).set_body_json(MockApiResponses::error_response(2200, "bad")))
        .mount(&mock_server)
        .await;

    let response = send(
        &state,
        request("POST", "/login", None, Some(json!({ "username": "mgr", "password": "no" }))),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Invalid username or password");
}

#[tokio::test]
async fn test_guard_blocks_sections_before_handlers() {
    let mock_server = MockServer::start().await;
    let state = portal(&mock_server);
    let token = sign_in(&state, &TestUser::user("alice"));

    let response = send(&state, request("GET", "/admin", Some(&token), None)).await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/"));
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_manager_sees_rooms() {
    let mock_server = MockServer::start().await;
    let state = portal(&mock_server);
    let token = sign_in(&state, &TestUser::manager("mgr"));

    Mock::given(method("GET"))
        .and(path("/rooms/with-status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::envelope(json!([
            { "roomId": 1, "name": "A", "location": "L1", "capacity": 4, "status": "AVAILABLE" }
        ]))))
        .mount(&mock_server)
        .await;

    let response = send(&state, request("GET", "/manager", Some(&token), None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body[0]["name"], "A");
    assert_eq!(body[0]["status"], "AVAILABLE");
}

#[tokio::test]
async fn test_user_dashboard_lists_unread_meetings() {
    let mock_server = MockServer::start().await;
    let state = portal(&mock_server);
    let user = TestUser::user("alice");
    let token = sign_in(&state, &user);

    Mock::given(method("GET"))
        .and(path("/users/my-profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::user_profile_response(&user)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/schedules/users/{}", user.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::envelope(json!([
            MockApiResponses::schedule_response(1, "Room A"),
            MockApiResponses::schedule_response(2, "Room B")
        ]))))
        .mount(&mock_server)
        .await;

    state.schedules.mark_read(1);
    let response = send(&state, request("GET", "/user", Some(&token), None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["schedules"].as_array().unwrap().len(), 2);
    assert_eq!(body["unread"], json!([2]));
}

#[tokio::test]
async fn test_upstream_401_tears_down_and_returns_to_login() {
    let mock_server = MockServer::start().await;
    let state = portal(&mock_server);
    let token = sign_in(&state, &TestUser::manager("mgr"));
    let shell_task = state.shell().spawn(state.api.subscribe());

    Mock::given(method("GET"))
        .and(path("/rooms/with-status"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let response = send(&state, request("GET", "/manager", Some(&token), None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    for _ in 0..50 {
        if state.navigator.current_path() == "/login" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(state.navigator.current_path(), "/login");
    assert!(state.api.session().get_token().is_none());
    shell_task.abort();
}

#[tokio::test]
async fn test_every_upstream_401_returns_to_login() {
    let mock_server = MockServer::start().await;
    let state = portal(&mock_server);
    let shell_task = state.shell().spawn(state.api.subscribe());

    Mock::given(method("GET"))
        .and(path("/rooms/with-status"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    for round in 1..=2 {
        let token = sign_in(&state, &TestUser::manager("mgr"));
        let response = send(&state, request("GET", "/manager", Some(&token), None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        for _ in 0..50 {
            if state.navigator.history().len() == 1 + 2 * round {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(state.navigator.current_path(), "/login");
    }

    assert_eq!(
        state.navigator.history(),
        vec!["/", "/manager", "/login", "/manager", "/login"]
    );
    shell_task.abort();
}

#[tokio::test]
async fn test_logout_expires_cookie() {
    let mock_server = MockServer::start().await;
    let state = portal(&mock_server);
    let token = sign_in(&state, &TestUser::user("alice"));

    let response = send(&state, request("POST", "/logout", Some(&token), None)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));
    assert!(set_cookie(&response).unwrap().contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
    assert!(state.api.session().get_token().is_none());
}

#[tokio::test]
async fn test_empty_chat_message_is_rejected() {
    let mock_server = MockServer::start().await;
    let state = portal(&mock_server);
    let token = sign_in(&state, &TestUser::user("alice"));

    let response = send(
        &state,
        request("POST", "/user/chat", Some(&token), Some(json!({ "message": "   " }))),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}
