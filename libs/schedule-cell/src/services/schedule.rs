use chrono::NaiveDateTime;
use serde_json::Value;
use tracing::debug;
use urlencoding::encode;

use shared_gateway::{ApiClient, GatewayError};
use shared_models::api::ApiResponse;

use super::format_date_time;
use crate::models::{
    unread_meetings, FreeTimeSlot, ScheduleByDepartmentRequest, ScheduleCreationRequest,
    ScheduleResponse, ScheduleUpdateRequest,
};

const SCHEDULES_PATH: &str = "/schedules";

#[derive(Debug, Clone)]
pub struct ScheduleService {
    api: ApiClient,
}

impl ScheduleService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn create_schedule(
        &self,
        request: &ScheduleCreationRequest,
    ) -> Result<ApiResponse<ScheduleResponse>, GatewayError> {
        debug!("Booking '{}' in room {}", request.title, request.room_id);
        self.api.post(SCHEDULES_PATH, request).await
    }

    /// Books a room for a whole department.
    pub async fn create_department_schedule(
        &self,
        department_name: &str,
        request: &ScheduleByDepartmentRequest,
    ) -> Result<ApiResponse<ScheduleResponse>, GatewayError> {
        debug!("Booking '{}' for department {}", request.title, department_name);
        self.api
            .post(
                &format!("{}/departments/{}", SCHEDULES_PATH, encode(department_name)),
                request,
            )
            .await
    }

    pub async fn simple_schedules(&self) -> Result<ApiResponse<Vec<ScheduleResponse>>, GatewayError> {
        self.api.get(&format!("{}/simple", SCHEDULES_PATH)).await
    }

    pub async fn user_schedules(
        &self,
        keycloak_id: &str,
    ) -> Result<ApiResponse<Vec<ScheduleResponse>>, GatewayError> {
        self.api
            .get(&format!("{}/users/{}", SCHEDULES_PATH, encode(keycloak_id)))
            .await
    }

    pub async fn get_schedule(&self, schedule_id: i64) -> Result<ApiResponse<ScheduleResponse>, GatewayError> {
        self.api.get(&format!("{}/{}", SCHEDULES_PATH, schedule_id)).await
    }

    pub async fn update_schedule(
        &self,
        schedule_id: i64,
        request: &ScheduleUpdateRequest,
    ) -> Result<ApiResponse<ScheduleResponse>, GatewayError> {
        debug!("Updating schedule {}", schedule_id);
        self.api
            .put(&format!("{}/{}", SCHEDULES_PATH, schedule_id), request)
            .await
    }

    pub async fn delete_schedule(&self, schedule_id: i64) -> Result<ApiResponse<Option<Value>>, GatewayError> {
        debug!("Deleting schedule {}", schedule_id);
        self.api.delete(&format!("{}/{}", SCHEDULES_PATH, schedule_id)).await
    }

    pub async fn free_slots(
        &self,
        room_name: &str,
        start: &NaiveDateTime,
        end: &NaiveDateTime,
    ) -> Result<ApiResponse<Vec<FreeTimeSlot>>, GatewayError> {
        let start = format_date_time(start);
        let end = format_date_time(end);
        self.api
            .get_with_query(
                &format!("{}/free/{}", SCHEDULES_PATH, encode(room_name)),
                &[("startDate", start.as_str()), ("endDate", end.as_str())],
            )
            .await
    }

    /// Filters out meetings already opened on this device.
    pub fn unread<'a>(&self, schedules: &'a [ScheduleResponse]) -> Vec<&'a ScheduleResponse> {
        unread_meetings(schedules, &self.api.session().read_meetings())
    }

    pub fn mark_read(&self, schedule_id: i64) -> bool {
        self.api.session().mark_meeting_read(&schedule_id.to_string())
    }
}
