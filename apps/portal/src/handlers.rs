use axum::{
    extract::{Json, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use chat_cell::AiResponse;
use guard_cell::{landing_path, request_token};
use schedule_cell::{RoomWithStatus, ScheduleResponse};
use shared_models::auth::{CurrentUser, LoginRequest, UserResponse};
use shared_models::routes;
use shared_session::SessionCookie;
use shared_utils::jwt::decode_token;

use crate::error::PortalError;
use crate::state::PortalState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDashboard {
    pub user: CurrentUser,
    pub schedules: Vec<ScheduleResponse>,
    pub unread: Vec<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatQuestion {
    pub message: String,
}

fn with_cookie(mut response: Response, cookie: SessionCookie) -> Response {
    match HeaderValue::from_str(&cookie.to_header_value()) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(e) => warn!("Could not build session cookie header: {}", e),
    }
    response
}

async fn signed_in_user(state: &PortalState) -> Result<CurrentUser, PortalError> {
    state
        .session
        .current_user()
        .await?
        .ok_or(PortalError::Unauthorized)
}

/// `/` sends a signed-in user to their section, everyone else to the login.
pub async fn landing(State(state): State<PortalState>, headers: HeaderMap) -> Redirect {
    let claims = request_token(&headers).and_then(|token| decode_token(&token));

    let target = match claims {
        Some(claims) => landing_path(&claims.roles(&state.config.client_id)),
        None => routes::LOGIN,
    };
    debug!("Landing redirect to {}", target);
    Redirect::temporary(target)
}

pub async fn login_view() -> Json<Value> {
    Json(json!({ "view": "login" }))
}

pub async fn login(
    State(state): State<PortalState>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, PortalError> {
    let user = state
        .session
        .login(&request)
        .await
        .map_err(|e| PortalError::from_gateway(e, "Login failed"))?
        .ok_or_else(|| PortalError::BadRequest("Login returned an unusable token".to_string()))?;

    let token = state
        .api
        .session()
        .get_token()
        .ok_or_else(|| PortalError::BadRequest("Login did not store a token".to_string()))?;

    Ok(with_cookie(Json(user).into_response(), SessionCookie::session(&token)))
}

pub async fn logout(State(state): State<PortalState>) -> Response {
    state.session.logout();
    with_cookie(
        Redirect::to(routes::LOGIN).into_response(),
        SessionCookie::expired(),
    )
}

pub async fn admin_view(State(state): State<PortalState>) -> Result<Json<Vec<UserResponse>>, PortalError> {
    Ok(Json(state.session.all_users().await?))
}

pub async fn manager_view(
    State(state): State<PortalState>,
) -> Result<Json<Vec<RoomWithStatus>>, PortalError> {
    let rooms = state.rooms.rooms_with_status().await?;
    Ok(Json(rooms.into_data()))
}

pub async fn user_view(State(state): State<PortalState>) -> Result<Json<UserDashboard>, PortalError> {
    let user = signed_in_user(&state).await?;
    let schedules = state
        .schedules
        .user_schedules(&user.keycloak_id)
        .await?
        .into_data();
    let unread = state
        .schedules
        .unread(&schedules)
        .into_iter()
        .map(|schedule| schedule.schedule_id)
        .collect();

    Ok(Json(UserDashboard {
        user,
        schedules,
        unread,
    }))
}

pub async fn chat_history(State(state): State<PortalState>) -> Result<Json<Vec<AiResponse>>, PortalError> {
    let user = signed_in_user(&state).await?;
    Ok(Json(state.chat.history(&user.keycloak_id).await?))
}

pub async fn ask_assistant(
    State(state): State<PortalState>,
    Json(question): Json<ChatQuestion>,
) -> Result<Json<Value>, PortalError> {
    if question.message.trim().is_empty() {
        return Err(PortalError::BadRequest("Message must not be empty".to_string()));
    }
    let user = signed_in_user(&state).await?;
    let reply = state
        .chat
        .ask(&user.keycloak_id, &question.message)
        .await
        .map_err(|e| PortalError::from_gateway(e, "The assistant is unavailable"))?;
    Ok(Json(json!({ "reply": reply })))
}
