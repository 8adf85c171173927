pub mod hooks;
pub mod models;
pub mod services;
pub mod sse;
pub mod stream;

pub use hooks::{ChatHooks, CHAT_HISTORY_KEY};
pub use models::{AiResponse, AskRequest, ChatRole};
pub use services::ChatbotService;
pub use sse::{SseDecoder, SseError, SseEvent, MAX_LINE_BYTES};
pub use stream::{ChatStream, AI_MESSAGE_EVENT};
