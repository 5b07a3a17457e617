// Public modules
pub mod chat_message;
pub mod chat_options;
pub mod chat_request;
pub mod chat_response;
pub mod model_config;
pub mod stream_chunk;

// Re-exports
pub use chat_message::{ChatMessage, ChatRole};
pub use chat_options::{ChatOptions, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
pub use chat_request::ChatRequest;
pub use chat_response::{ChatResponse, Choice, Usage};
pub use model_config::ModelConfig;
pub use stream_chunk::{ChunkChoice, Delta, StreamChunk};
