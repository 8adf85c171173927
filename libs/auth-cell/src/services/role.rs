use tracing::debug;

use shared_gateway::{ApiClient, GatewayError};
use shared_models::api::ApiResponse;

use crate::models::AssignRoleRequest;

#[derive(Debug, Clone)]
pub struct RoleService {
    api: ApiClient,
}

impl RoleService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn assign(
        &self,
        user_id: i64,
        request: &AssignRoleRequest,
    ) -> Result<ApiResponse<String>, GatewayError> {
        debug!("Assigning role {} to user {}", request.role_name, user_id);
        self.api.post(&format!("/roles/assign/{}", user_id), request).await
    }

    pub async fn unassign(
        &self,
        user_id: i64,
        request: &AssignRoleRequest,
    ) -> Result<ApiResponse<String>, GatewayError> {
        debug!("Removing role {} from user {}", request.role_name, user_id);
        self.api
            .delete_with_body(&format!("/roles/unassign/{}", user_id), request)
            .await
    }
}
