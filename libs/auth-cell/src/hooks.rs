use std::sync::Arc;

use tracing::{debug, info};

use shared_gateway::{ApiClient, GatewayError};
use shared_models::api::ApiResponse;
use shared_models::auth::{CurrentUser, LoginRequest, Role, TokenResponse, UserResponse};
use shared_models::routes;
use shared_session::{QueryCache, SessionStore};

use crate::models::{AssignRoleRequest, UserUpdateRequest};
use crate::services::{RoleService, UserService};
use crate::shell::Navigator;

pub const CURRENT_USER_KEY: [&str; 2] = ["auth", "me"];
pub const USERS_KEY: [&str; 1] = ["users"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleFlags {
    pub is_admin: bool,
    pub is_manager: bool,
    pub is_user: bool,
}

/// Session-aware accessors used by views.
#[derive(Clone)]
pub struct SessionHooks {
    api: ApiClient,
    users: UserService,
    roles: RoleService,
    cache: QueryCache,
    navigator: Arc<dyn Navigator>,
}

impl SessionHooks {
    pub fn new(api: ApiClient, cache: QueryCache, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            users: UserService::new(api.clone()),
            roles: RoleService::new(api.clone()),
            api,
            cache,
            navigator,
        }
    }

    fn session(&self) -> &SessionStore {
        self.api.session()
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Who is signed in, merged from the token and the server profile.
    ///
    /// The answer is cached until `login`, a profile update or a logout
    /// invalidates it; failures are not cached.
    pub async fn current_user(&self) -> Result<Option<CurrentUser>, GatewayError> {
        if let Some(cached) = self.cache.get::<Option<CurrentUser>>(&CURRENT_USER_KEY) {
            return Ok(cached);
        }

        let user = self.fetch_current_user().await?;
        self.cache.set(&CURRENT_USER_KEY, &user);
        Ok(user)
    }

    async fn fetch_current_user(&self) -> Result<Option<CurrentUser>, GatewayError> {
        let Some(claims) = self.session().decode_claims() else {
            debug!("No usable session token, no current user");
            return Ok(None);
        };
        let roles = claims.roles(self.session().client_id());

        let profile = self.users.my_profile().await?.into_data();
        let merged = CurrentUser::from_profile(profile, roles);
        self.session().set_current_user(&merged);

        Ok(Some(merged))
    }

    /// Signs in and seeds a token-only user until the profile is fetched.
    pub async fn login(&self, request: &LoginRequest) -> Result<Option<CurrentUser>, GatewayError> {
        let response: ApiResponse<TokenResponse> = self.users.login(request).await?;
        let token = response.data.access_token;

        self.session().persist_token(&token);

        let seeded = self.session().decode_claims().map(|claims| {
            let roles = claims.roles(self.session().client_id());
            CurrentUser::from_claims(&claims, roles)
        });
        if let Some(user) = &seeded {
            self.session().set_current_user(user);
        }

        self.cache.invalidate(&CURRENT_USER_KEY);
        info!("Signed in as {}", request.username);
        Ok(seeded)
    }

    pub fn logout(&self) {
        info!("Signing out");
        self.session().logout();
        self.cache.clear();
        self.navigator.navigate(routes::LOGIN);
    }

    pub async fn update_profile(
        &self,
        keycloak_id: &str,
        request: &UserUpdateRequest,
    ) -> Result<UserResponse, GatewayError> {
        let updated = self.users.update_profile(keycloak_id, request).await?;
        self.cache.invalidate(&CURRENT_USER_KEY);
        Ok(updated.into_data())
    }

    pub async fn all_users(&self) -> Result<Vec<UserResponse>, GatewayError> {
        if let Some(cached) = self.cache.get::<Vec<UserResponse>>(&USERS_KEY) {
            return Ok(cached);
        }
        let users = self.users.all_users().await?.into_data();
        self.cache.set(&USERS_KEY, &users);
        Ok(users)
    }

    pub async fn assign_role(&self, user_id: i64, role: Role) -> Result<String, GatewayError> {
        let request = AssignRoleRequest {
            role_name: role.to_string(),
        };
        let response = self.roles.assign(user_id, &request).await?;
        self.cache.invalidate(&USERS_KEY);
        Ok(response.into_data())
    }

    pub async fn unassign_role(&self, user_id: i64, role: Role) -> Result<String, GatewayError> {
        let request = AssignRoleRequest {
            role_name: role.to_string(),
        };
        let response = self.roles.unassign(user_id, &request).await?;
        self.cache.invalidate(&USERS_KEY);
        Ok(response.into_data())
    }

    pub fn role_flags(&self) -> RoleFlags {
        let roles = self.session().roles();
        RoleFlags {
            is_admin: roles.contains(&Role::Admin),
            is_manager: roles.contains(&Role::Manager),
            is_user: roles.contains(&Role::User),
        }
    }
}
