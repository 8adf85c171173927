pub mod department;
pub mod room;
pub mod schedule;

pub use department::DepartmentService;
pub use room::RoomService;
pub use schedule::ScheduleService;

use chrono::NaiveDateTime;

pub(crate) const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub(crate) fn format_date_time(value: &NaiveDateTime) -> String {
    value.format(DATE_TIME_FORMAT).to_string()
}
