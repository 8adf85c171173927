use serde::{Deserialize, Serialize};

/// Error envelope returned by the scheduling API on non-2xx responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    #[serde(default)]
    pub status_code: Option<i32>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Parses an error body, keeping raw text as the message when it is not JSON.
    pub fn from_text(text: &str) -> Self {
        match serde_json::from_str::<ApiErrorBody>(text) {
            Ok(body) => body,
            Err(_) if text.trim().is_empty() => Self::default(),
            Err(_) => Self {
                status_code: None,
                message: Some(text.trim().to_string()),
            },
        }
    }
}

/// Application error codes the server attaches to failures.
pub mod codes {
    pub const NETWORK_UNREACHABLE: i32 = 0;
    pub const PASSWORD_TOO_SHORT: i32 = 2002;
    pub const LASTNAME_REQUIRED: i32 = 2003;
    pub const FIRSTNAME_REQUIRED: i32 = 2004;
    pub const DOB_REQUIRED: i32 = 2005;
    pub const DOB_NOT_IN_PAST: i32 = 2006;
    pub const NEW_PASSWORD_REQUIRED: i32 = 2025;
    pub const OLD_PASSWORD_REQUIRED: i32 = 2026;
    pub const UNAUTHENTICATED: i32 = 2200;
    pub const FORBIDDEN: i32 = 2201;
    pub const WRONG_OLD_PASSWORD: i32 = 2202;
    pub const UNCATEGORIZED: i32 = 2999;
}

pub fn known_message(code: i32) -> Option<&'static str> {
    let message = match code {
        codes::NETWORK_UNREACHABLE => "Cannot reach the server. Check your network connection.",
        codes::PASSWORD_TOO_SHORT => "Password must be at least 6 characters",
        codes::LASTNAME_REQUIRED => "Last name is required",
        codes::FIRSTNAME_REQUIRED => "First name is required",
        codes::DOB_REQUIRED => "Date of birth is required",
        codes::DOB_NOT_IN_PAST => "Date of birth must be in the past",
        codes::NEW_PASSWORD_REQUIRED => "New password is required",
        codes::OLD_PASSWORD_REQUIRED => "Current password is required",
        codes::UNAUTHENTICATED => "Invalid username or password",
        codes::FORBIDDEN => "You do not have permission to perform this action",
        codes::WRONG_OLD_PASSWORD => "Current password is incorrect",
        _ => return None,
    };
    Some(message)
}

/// Maps an application error code to a user-facing message.
///
/// Unmapped codes (including 2999) use the server message when present and
/// `fallback` otherwise.
pub fn describe_error(code: Option<i32>, message: Option<&str>, fallback: &str) -> String {
    code.and_then(known_message)
        .or(message.filter(|m| !m.trim().is_empty()))
        .unwrap_or(fallback)
        .to_string()
}
