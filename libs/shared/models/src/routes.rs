//! Navigation paths shared by the guard, the shell and the hooks.

pub const ROOT: &str = "/";
pub const LOGIN: &str = "/login";
pub const ADMIN: &str = "/admin";
pub const MANAGER: &str = "/manager";
pub const USER: &str = "/user";

/// True when `path` is `section` itself or lies beneath it.
pub fn in_section(path: &str, section: &str) -> bool {
    path == section
        || path
            .strip_prefix(section)
            .is_some_and(|rest| rest.starts_with('/'))
}
