pub mod client;
pub mod error;
pub mod scope;

pub use client::{ApiClient, SessionEvent, ROTATED_TOKEN_HEADER};
pub use error::GatewayError;
pub use reqwest::Method;
pub use scope::RequestScope;
