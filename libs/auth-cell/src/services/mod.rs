pub mod role;
pub mod user;

pub use role::RoleService;
pub use user::UserService;
