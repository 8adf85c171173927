pub mod hooks;
pub mod models;
pub mod services;
pub mod shell;

pub use hooks::{RoleFlags, SessionHooks, CURRENT_USER_KEY};
pub use services::{RoleService, UserService};
pub use shell::{AppShell, HistoryNavigator, Navigator, HISTORY_LIMIT};
