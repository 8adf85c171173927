use std::collections::HashMap;

use parking_lot::Mutex;

pub const SESSION_COOKIE: &str = "access_token";
const EPOCH_EXPIRY: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// The cookie that mirrors the stored token for request-time route checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub path: String,
    pub same_site_strict: bool,
    pub expired: bool,
}

impl SessionCookie {
    /// Session-scoped, `Path=/`, `SameSite=Strict`.
    pub fn session(value: &str) -> Self {
        Self {
            name: SESSION_COOKIE.to_string(),
            value: value.to_string(),
            path: "/".to_string(),
            same_site_strict: true,
            expired: false,
        }
    }

    /// Deletion form: empty value, expiry in the past.
    pub fn expired() -> Self {
        Self {
            name: SESSION_COOKIE.to_string(),
            value: String::new(),
            path: "/".to_string(),
            same_site_strict: false,
            expired: true,
        }
    }

    pub fn to_header_value(&self) -> String {
        let mut header = format!("{}={}; Path={}", self.name, self.value, self.path);
        if self.same_site_strict {
            header.push_str("; SameSite=Strict");
        }
        if self.expired {
            header.push_str("; Expires=");
            header.push_str(EPOCH_EXPIRY);
        }
        header
    }
}

pub trait CookieJar: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, cookie: SessionCookie);
}

#[derive(Debug, Default)]
pub struct MemoryCookieJar {
    cookies: Mutex<HashMap<String, SessionCookie>>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Header value of the live cookie, if any.
    pub fn header_value(&self, name: &str) -> Option<String> {
        self.cookies.lock().get(name).map(SessionCookie::to_header_value)
    }
}

impl CookieJar for MemoryCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        self.cookies.lock().get(name).map(|cookie| cookie.value.clone())
    }

    fn set(&self, cookie: SessionCookie) {
        let mut cookies = self.cookies.lock();
        if cookie.expired {
            cookies.remove(&cookie.name);
        } else {
            cookies.insert(cookie.name.clone(), cookie);
        }
    }
}
