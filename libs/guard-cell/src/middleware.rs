use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use headers::{authorization::Bearer, Authorization, Cookie, HeaderMapExt};
use tracing::{debug, warn};

use shared_session::{SessionCookie, SESSION_COOKIE};

use crate::guard::{GuardDecision, RouteGuard};

/// Token for the guard: the session cookie, else a bearer credential.
pub fn request_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .typed_get::<Cookie>()
        .and_then(|cookie| cookie.get(SESSION_COOKIE).map(str::to_string))
        .filter(|token| !token.is_empty());

    from_cookie.or_else(|| {
        headers
            .typed_get::<Authorization<Bearer>>()
            .map(|auth| auth.token().to_string())
    })
}

// Runs before any section handler.
pub async fn route_guard(
    State(guard): State<Arc<RouteGuard>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let token = request_token(request.headers());
    let path = request.uri().path().to_string();

    match guard.evaluate(&path, token.as_deref()) {
        GuardDecision::Allow => next.run(request).await,
        GuardDecision::Redirect {
            location,
            clear_cookie,
        } => {
            debug!("Redirecting {} to {}", path, location);
            let mut response = Redirect::temporary(location).into_response();

            if clear_cookie {
                match HeaderValue::from_str(&SessionCookie::expired().to_header_value()) {
                    Ok(value) => {
                        response.headers_mut().append(SET_COOKIE, value);
                    }
                    Err(e) => warn!("Could not build cookie removal header: {}", e),
                }
            }

            response
        }
    }
}
