use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use shared_models::auth::{CurrentUser, JwtClaims, Role};
use shared_utils::jwt::decode_token;

use crate::cookie::{CookieJar, MemoryCookieJar, SessionCookie, SESSION_COOKIE};
use crate::storage::{MemoryStorage, Storage};

pub const TOKEN_KEY: &str = "auth_token";
pub const USER_KEY: &str = "current_user";
pub const READ_MEETINGS_KEY: &str = "read_meetings";

/// Handle on the persisted session: raw token, cached user and cookie mirror.
///
/// Clones share the same backends. A store without backends behaves like a
/// non-interactive context: reads return nothing and writes are dropped.
#[derive(Clone)]
pub struct SessionStore {
    storage: Option<Arc<dyn Storage>>,
    cookies: Option<Arc<dyn CookieJar>>,
    client_id: String,
}

impl SessionStore {
    pub fn new(
        storage: Arc<dyn Storage>,
        cookies: Arc<dyn CookieJar>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            storage: Some(storage),
            cookies: Some(cookies),
            client_id: client_id.into(),
        }
    }

    pub fn in_memory(client_id: impl Into<String>) -> Self {
        Self::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryCookieJar::new()),
            client_id,
        )
    }

    pub fn detached(client_id: impl Into<String>) -> Self {
        Self {
            storage: None,
            cookies: None,
            client_id: client_id.into(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn get_token(&self) -> Option<String> {
        self.storage
            .as_ref()?
            .get(TOKEN_KEY)
            .filter(|token| !token.is_empty())
    }

    pub fn set_token(&self, token: &str) {
        if let Some(storage) = &self.storage {
            storage.set(TOKEN_KEY, token);
        }
    }

    pub fn remove_token(&self) {
        if let Some(storage) = &self.storage {
            storage.remove(TOKEN_KEY);
        }
    }

    pub fn get_current_user(&self) -> Option<CurrentUser> {
        let raw = self.storage.as_ref()?.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Stored current user is unreadable: {}", e);
                None
            }
        }
    }

    pub fn set_current_user(&self, user: &CurrentUser) {
        let Some(storage) = &self.storage else {
            return;
        };
        match serde_json::to_string(user) {
            Ok(raw) => storage.set(USER_KEY, &raw),
            Err(e) => warn!("Could not serialize current user: {}", e),
        }
    }

    pub fn remove_current_user(&self) {
        if let Some(storage) = &self.storage {
            storage.remove(USER_KEY);
        }
    }

    pub fn cookie_token(&self) -> Option<String> {
        self.cookies.as_ref()?.get(SESSION_COOKIE)
    }

    pub fn mirror_cookie(&self, token: &str) {
        if let Some(cookies) = &self.cookies {
            cookies.set(SessionCookie::session(token));
        }
    }

    pub fn clear_cookie(&self) {
        if let Some(cookies) = &self.cookies {
            cookies.set(SessionCookie::expired());
        }
    }

    /// Stores `token` and mirrors it into the cookie.
    pub fn persist_token(&self, token: &str) {
        self.set_token(token);
        self.mirror_cookie(token);
    }

    /// Removes token, cached user and cookie.
    pub fn logout(&self) {
        debug!("Clearing session");
        self.remove_token();
        self.remove_current_user();
        self.clear_cookie();
    }

    /// Claims of the stored token.
    pub fn decode_claims(&self) -> Option<JwtClaims> {
        decode_token(&self.get_token()?)
    }

    pub fn roles(&self) -> BTreeSet<Role> {
        self.decode_claims()
            .map(|claims| claims.roles(&self.client_id))
            .unwrap_or_default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.decode_claims().is_some()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles().contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    pub fn is_manager(&self) -> bool {
        self.has_role(Role::Manager)
    }

    pub fn is_user(&self) -> bool {
        self.has_role(Role::User)
    }

    pub fn read_meetings(&self) -> BTreeSet<String> {
        self.storage
            .as_ref()
            .and_then(|storage| storage.get(READ_MEETINGS_KEY))
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    /// Returns `false` when the meeting was already marked.
    pub fn mark_meeting_read(&self, schedule_id: &str) -> bool {
        let Some(storage) = &self.storage else {
            return false;
        };
        let mut read = self.read_meetings();
        if !read.insert(schedule_id.to_string()) {
            return false;
        }
        match serde_json::to_string(&read) {
            Ok(raw) => storage.set(READ_MEETINGS_KEY, &raw),
            Err(e) => warn!("Could not persist read meetings: {}", e),
        }
        true
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("attached", &self.storage.is_some())
            .field("client_id", &self.client_id)
            .finish()
    }
}
