use serde::{Deserialize, Serialize};

/// Envelope wrapped around every JSON payload returned by the scheduling API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status_code: Option<i32>,
    pub message: Option<String>,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn into_data(self) -> T {
        self.data
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ApiResponse<U> {
        ApiResponse {
            status_code: self.status_code,
            message: self.message,
            data: f(self.data),
        }
    }
}
