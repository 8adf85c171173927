use serde_json::Value;
use tracing::debug;

use shared_gateway::{ApiClient, GatewayError};
use shared_models::api::ApiResponse;
use shared_models::auth::UserResponse;

use crate::models::{DepartmentCreationRequest, DepartmentResponse};

const DEPARTMENTS_PATH: &str = "/departments";

#[derive(Debug, Clone)]
pub struct DepartmentService {
    api: ApiClient,
}

impl DepartmentService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn create_department(
        &self,
        request: &DepartmentCreationRequest,
    ) -> Result<ApiResponse<DepartmentResponse>, GatewayError> {
        debug!("Creating department {}", request.name);
        self.api.post(DEPARTMENTS_PATH, request).await
    }

    pub async fn all_departments(&self) -> Result<ApiResponse<Vec<DepartmentResponse>>, GatewayError> {
        self.api.get(&format!("{}/all", DEPARTMENTS_PATH)).await
    }

    pub async fn get_department(
        &self,
        department_id: i64,
    ) -> Result<ApiResponse<DepartmentResponse>, GatewayError> {
        self.api.get(&format!("{}/{}", DEPARTMENTS_PATH, department_id)).await
    }

    pub async fn department_users(
        &self,
        department_id: i64,
    ) -> Result<ApiResponse<Vec<UserResponse>>, GatewayError> {
        self.api
            .get(&format!("{}/{}/users", DEPARTMENTS_PATH, department_id))
            .await
    }

    pub async fn delete_department(&self, department_id: i64) -> Result<ApiResponse<Option<Value>>, GatewayError> {
        debug!("Deleting department {}", department_id);
        self.api.delete(&format!("{}/{}", DEPARTMENTS_PATH, department_id)).await
    }
}
