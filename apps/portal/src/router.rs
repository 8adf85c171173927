use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};

use auth_cell::{HistoryNavigator, Navigator};
use guard_cell::route_guard;

use crate::handlers;
use crate::state::PortalState;

/// Records every view the guard let through as the current location.
async fn track_location(
    State(navigator): State<Arc<HistoryNavigator>>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() == Method::GET {
        navigator.navigate(request.uri().path());
    }
    next.run(request).await
}

pub fn create_router(state: PortalState) -> Router {
    let guard = state.guard.clone();
    let navigator = state.navigator.clone();

    Router::new()
        .route("/", get(handlers::landing))
        .route("/login", get(handlers::login_view).post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/admin", get(handlers::admin_view))
        .route("/manager", get(handlers::manager_view))
        .route("/user", get(handlers::user_view))
        .route("/user/chat", get(handlers::chat_history).post(handlers::ask_assistant))
        .layer(middleware::from_fn_with_state(navigator, track_location))
        .layer(middleware::from_fn_with_state(guard, route_guard))
        .with_state(state)
}
