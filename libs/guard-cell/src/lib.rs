pub mod guard;
pub mod middleware;

pub use guard::{landing_path, GuardDecision, PathClass, RoleRequirement, RouteGuard};
pub use middleware::{request_token, route_guard};
