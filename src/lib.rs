// Public modules
pub mod cli;
pub mod client;
pub mod error;
pub mod fanout;
pub mod files;
pub mod history;
pub mod model;
pub mod observability;
pub mod registry;
pub mod render;
pub mod sse;
pub mod types;
pub mod utils;

// Re-exports
pub use client::{ChatClient, DEFAULT_TIMEOUT, endpoint_url};
pub use error::{Error, Result};
pub use fanout::{FanoutResult, ask_many};
pub use history::{Session, SessionInfo, SessionStore};
pub use model::{Backend, FileContext, Model, compose_file_prompt};
pub use observability::register_biometrics;
pub use registry::ModelRegistry;
pub use render::{CollectingRenderer, PlainTextRenderer, Renderer, SilentRenderer};
pub use sse::{StreamOutcome, decode_stream};
pub use types::*;
