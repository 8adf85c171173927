use tracing::debug;

use shared_gateway::{ApiClient, GatewayError};
use shared_models::api::ApiResponse;
use shared_models::auth::{LoginRequest, TokenResponse, UserResponse};

use crate::models::{ChangePasswordRequest, RoleRepresentation, UserCreationRequest, UserUpdateRequest};

const USERS_PATH: &str = "/users";

#[derive(Debug, Clone)]
pub struct UserService {
    api: ApiClient,
}

impl UserService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<ApiResponse<TokenResponse>, GatewayError> {
        debug!("Logging in as {}", request.username);
        self.api.post(&format!("{}/login", USERS_PATH), request).await
    }

    pub async fn register(
        &self,
        request: &UserCreationRequest,
    ) -> Result<ApiResponse<UserResponse>, GatewayError> {
        debug!("Registering user {}", request.username);
        self.api.post(&format!("{}/register", USERS_PATH), request).await
    }

    pub async fn all_users(&self) -> Result<ApiResponse<Vec<UserResponse>>, GatewayError> {
        self.api.get(&format!("{}/all", USERS_PATH)).await
    }

    pub async fn my_profile(&self) -> Result<ApiResponse<UserResponse>, GatewayError> {
        self.api.get(&format!("{}/my-profile", USERS_PATH)).await
    }

    pub async fn get_user(&self, keycloak_id: &str) -> Result<ApiResponse<UserResponse>, GatewayError> {
        self.api.get(&format!("{}/{}", USERS_PATH, keycloak_id)).await
    }

    pub async fn user_roles(&self, keycloak_id: &str) -> Result<Vec<RoleRepresentation>, GatewayError> {
        self.api.get(&format!("{}/role/{}", USERS_PATH, keycloak_id)).await
    }

    pub async fn update_profile(
        &self,
        keycloak_id: &str,
        request: &UserUpdateRequest,
    ) -> Result<ApiResponse<UserResponse>, GatewayError> {
        debug!("Updating profile for {}", keycloak_id);
        self.api.put(&format!("{}/{}", USERS_PATH, keycloak_id), request).await
    }

    pub async fn change_password(
        &self,
        user_id: &str,
        request: &ChangePasswordRequest,
    ) -> Result<ApiResponse<bool>, GatewayError> {
        debug!("Changing password for user {}", user_id);
        self.api
            .put(&format!("{}/{}/change-password", USERS_PATH, user_id), request)
            .await
    }
}
