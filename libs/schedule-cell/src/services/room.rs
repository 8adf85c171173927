use chrono::NaiveDateTime;
use tracing::debug;

use shared_gateway::{ApiClient, GatewayError};
use shared_models::api::ApiResponse;

use super::format_date_time;
use crate::models::{RoomRequest, RoomResponse, RoomWithStatus};

const ROOMS_PATH: &str = "/rooms";

#[derive(Debug, Clone)]
pub struct RoomService {
    api: ApiClient,
}

impl RoomService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn rooms_with_status(&self) -> Result<ApiResponse<Vec<RoomWithStatus>>, GatewayError> {
        self.api.get(&format!("{}/with-status", ROOMS_PATH)).await
    }

    /// Rooms with no booking overlapping `[start, end)`.
    pub async fn available_rooms(
        &self,
        start: &NaiveDateTime,
        end: &NaiveDateTime,
    ) -> Result<ApiResponse<Vec<RoomResponse>>, GatewayError> {
        let start = format_date_time(start);
        let end = format_date_time(end);
        debug!("Looking up rooms free between {} and {}", start, end);
        self.api
            .get_with_query(
                &format!("{}/available", ROOMS_PATH),
                &[("startDate", start.as_str()), ("endDate", end.as_str())],
            )
            .await
    }

    pub async fn all_rooms(&self) -> Result<ApiResponse<Vec<RoomResponse>>, GatewayError> {
        self.api.get(&format!("{}/all", ROOMS_PATH)).await
    }

    pub async fn get_room(&self, room_id: i64) -> Result<ApiResponse<RoomResponse>, GatewayError> {
        self.api.get(&format!("{}/{}", ROOMS_PATH, room_id)).await
    }

    pub async fn create_room(&self, request: &RoomRequest) -> Result<ApiResponse<RoomResponse>, GatewayError> {
        debug!("Creating room {}", request.name);
        self.api.post(ROOMS_PATH, request).await
    }

    pub async fn update_room(
        &self,
        room_id: i64,
        request: &RoomRequest,
    ) -> Result<ApiResponse<RoomResponse>, GatewayError> {
        debug!("Updating room {}", room_id);
        self.api.put(&format!("{}/{}", ROOMS_PATH, room_id), request).await
    }

    pub async fn delete_room(&self, room_id: i64) -> Result<ApiResponse<Option<serde_json::Value>>, GatewayError> {
        debug!("Deleting room {}", room_id);
        self.api.delete(&format!("{}/{}", ROOMS_PATH, room_id)).await
    }
}
