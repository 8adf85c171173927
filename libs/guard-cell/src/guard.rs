use std::collections::BTreeSet;

use tracing::debug;

use shared_models::auth::Role;
use shared_models::routes::{self, in_section};
use shared_utils::jwt::decode_token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleRequirement {
    /// Any signed-in user, whatever their roles.
    Authenticated,
    Admin,
    AdminOrManager,
}

impl RoleRequirement {
    pub fn admits(&self, roles: &BTreeSet<Role>) -> bool {
        match self {
            RoleRequirement::Authenticated => true,
            RoleRequirement::Admin => roles.contains(&Role::Admin),
            RoleRequirement::AdminOrManager => {
                roles.contains(&Role::Admin) || roles.contains(&Role::Manager)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    /// `/`: always let through, the landing view routes onward.
    Neutral,
    /// The login view.
    Public,
    Protected(RoleRequirement),
    /// Assets and API calls the guard never inspects.
    Bypass,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect {
        location: &'static str,
        clear_cookie: bool,
    },
}

impl GuardDecision {
    fn redirect(location: &'static str) -> Self {
        GuardDecision::Redirect {
            location,
            clear_cookie: false,
        }
    }
}

/// Per-navigation access check over the route table.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    client_id: String,
    bypass_prefixes: Vec<String>,
}

impl RouteGuard {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            bypass_prefixes: ["/static", "/assets", "/api", "/favicon.ico"]
                .iter()
                .map(|prefix| prefix.to_string())
                .collect(),
        }
    }

    pub fn with_bypass(mut self, prefix: impl Into<String>) -> Self {
        self.bypass_prefixes.push(prefix.into());
        self
    }

    pub fn classify(&self, path: &str) -> PathClass {
        if path == routes::ROOT {
            PathClass::Neutral
        } else if self.bypass_prefixes.iter().any(|prefix| in_section(path, prefix)) {
            PathClass::Bypass
        } else if path == routes::LOGIN {
            PathClass::Public
        } else if in_section(path, routes::ADMIN) {
            PathClass::Protected(RoleRequirement::Admin)
        } else if in_section(path, routes::MANAGER) {
            PathClass::Protected(RoleRequirement::AdminOrManager)
        } else {
            PathClass::Protected(RoleRequirement::Authenticated)
        }
    }

    pub fn evaluate(&self, path: &str, token: Option<&str>) -> GuardDecision {
        let token = token.filter(|t| !t.is_empty());
        let class = self.classify(path);

        let decision = match (class, token) {
            (PathClass::Neutral | PathClass::Bypass, _) => GuardDecision::Allow,
            (PathClass::Public, Some(_)) => GuardDecision::redirect(routes::ROOT),
            (PathClass::Public, None) => GuardDecision::Allow,
            (PathClass::Protected(_), None) => GuardDecision::redirect(routes::LOGIN),
            (PathClass::Protected(requirement), Some(token)) => match decode_token(token) {
                None => GuardDecision::Redirect {
                    location: routes::LOGIN,
                    clear_cookie: true,
                },
                Some(claims) => {
                    if requirement.admits(&claims.roles(&self.client_id)) {
                        GuardDecision::Allow
                    } else {
                        GuardDecision::redirect(routes::ROOT)
                    }
                }
            },
        };

        debug!("Guard {} ({:?}) -> {:?}", path, class, decision);
        decision
    }
}

/// Section a signed-in user lands on from `/`.
pub fn landing_path(roles: &BTreeSet<Role>) -> &'static str {
    if roles.contains(&Role::Admin) {
        routes::ADMIN
    } else if roles.contains(&Role::Manager) {
        routes::MANAGER
    } else {
        routes::USER
    }
}
