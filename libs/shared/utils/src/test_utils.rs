use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use uuid::Uuid;

use shared_config::{ClientConfig, DEFAULT_CLIENT_ID};
use shared_models::auth::{CurrentUser, Role};

pub struct TestConfig {
    pub api_base_url: String,
    pub client_id: String,
    pub jwt_secret: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            jwt_secret: "test-secret-key-for-jwt-signing-must-be-long-enough".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            api_base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig {
            api_base_url: self.api_base_url.clone(),
            client_id: self.client_id.clone(),
            request_timeout_secs: 5,
            ..ClientConfig::default()
        }
    }
}

pub struct TestUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("tester", &["USER"])
    }
}

impl TestUser {
    pub fn new(username: &str, roles: &[&str]) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: format!("{}@example.com", username),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn admin(username: &str) -> Self {
        Self::new(username, &["ADMIN"])
    }

    pub fn manager(username: &str) -> Self {
        Self::new(username, &["MANAGER"])
    }

    pub fn user(username: &str) -> Self {
        Self::new(username, &["USER"])
    }

    pub fn claims(&self, exp_hours: i64) -> Value {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours);

        json!({
            "sub": self.id,
            "preferred_username": self.username,
            "given_name": "Test",
            "family_name": "User",
            "email": self.email,
            "realm_access": { "roles": self.roles },
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        })
    }

    pub fn to_current_user(&self) -> CurrentUser {
        CurrentUser {
            keycloak_id: self.id.clone(),
            username: self.username.clone(),
            firstname: "Test".to_string(),
            lastname: "User".to_string(),
            email: self.email.clone(),
            roles: self.roles.iter().filter_map(|r| r.parse::<Role>().ok()).collect(),
            ..CurrentUser::default()
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        Self::sign_payload(&user.claims(exp_hours.unwrap_or(24)), secret)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    /// Token whose roles are granted only through `resource_access`.
    pub fn create_client_role_token(user: &TestUser, client_id: &str, secret: &str) -> String {
        let mut claims = user.claims(24);
        if let Some(object) = claims.as_object_mut() {
            object.remove("realm_access");
            let mut clients = serde_json::Map::new();
            clients.insert(client_id.to_string(), json!({ "roles": user.roles }));
            object.insert("resource_access".to_string(), Value::Object(clients));
        }
        Self::sign_payload(&claims, secret)
    }

    pub fn sign_payload(payload: &Value, secret: &str) -> String {
        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

pub struct MockApiResponses;

impl MockApiResponses {
    pub fn envelope(data: Value) -> Value {
        json!({
            "statusCode": 1000,
            "message": "Success",
            "data": data
        })
    }

    pub fn token_response(token: &str) -> Value {
        Self::envelope(json!({
            "accessToken": token,
            "refreshToken": "refresh-token",
            "expiresIn": 300
        }))
    }

    pub fn user_profile_response(user: &TestUser) -> Value {
        Self::envelope(json!({
            "userId": 42,
            "keycloakId": user.id,
            "username": user.username,
            "firstname": "Test",
            "lastname": "User",
            "email": user.email,
            "dob": "1990-01-01",
            "department": { "departmentId": 3, "name": "Engineering" }
        }))
    }

    pub fn room_response(room_id: i64) -> Value {
        json!({
            "roomId": room_id,
            "name": format!("Room {}", room_id),
            "location": "Floor 2",
            "capacity": 12
        })
    }

    pub fn schedule_response(schedule_id: i64, room_name: &str) -> Value {
        json!({
            "scheduleId": schedule_id,
            "title": "Sprint planning",
            "description": "Weekly planning",
            "roomName": room_name,
            "startTime": "2024-12-02T09:00:00",
            "endTime": "2024-12-02T10:00:00",
            "status": "CONFIRMED",
            "attendees": ["alice", "bob"]
        })
    }

    pub fn error_response(status_code: i32, message: &str) -> Value {
        json!({
            "statusCode": status_code,
            "message": message
        })
    }
}
