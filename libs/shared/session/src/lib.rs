pub mod cache;
pub mod cookie;
pub mod storage;
pub mod store;

pub use cache::QueryCache;
pub use cookie::{CookieJar, MemoryCookieJar, SessionCookie, SESSION_COOKIE};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use store::SessionStore;
