use std::collections::BTreeSet;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==============================================================================
// ROOMS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomResponse {
    pub room_id: i64,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub capacity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRequest {
    pub name: String,
    pub location: String,
    pub capacity: i32,
}

/// Room plus its occupancy right now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomWithStatus {
    #[serde(flatten)]
    pub room: RoomResponse,
    #[serde(default)]
    pub status: Option<String>,
}

impl RoomWithStatus {
    pub fn is_available(&self) -> bool {
        self.status
            .as_deref()
            .map_or(true, |status| status.eq_ignore_ascii_case("AVAILABLE"))
    }
}

// ==============================================================================
// SCHEDULES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub schedule_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub room_name: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub attendees: Vec<String>,
}

impl ScheduleResponse {
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    pub fn is_upcoming(&self, now: NaiveDateTime) -> bool {
        self.end_time > now
    }
}

/// Meetings the user has not opened yet, in start order.
pub fn unread_meetings<'a>(
    schedules: &'a [ScheduleResponse],
    read: &BTreeSet<String>,
) -> Vec<&'a ScheduleResponse> {
    let mut unread: Vec<&ScheduleResponse> = schedules
        .iter()
        .filter(|schedule| !read.contains(&schedule.schedule_id.to_string()))
        .collect();
    unread.sort_by_key(|schedule| schedule.start_time);
    unread
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleCreationRequest {
    pub title: String,
    pub description: Option<String>,
    pub room_id: i64,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    #[serde(default)]
    pub attendee_keycloak_ids: Vec<String>,
}

/// Booking addressed by room and department names instead of ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleByDepartmentRequest {
    pub title: String,
    pub description: Option<String>,
    pub room_name: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeTimeSlot {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

impl FreeTimeSlot {
    pub fn fits(&self, length: Duration) -> bool {
        self.end_time - self.start_time >= length
    }
}

// ==============================================================================
// DEPARTMENTS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentResponse {
    pub department_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentCreationRequest {
    pub name: String,
    pub description: Option<String>,
}
