use serde::{Deserialize, Serialize};

use crate::types::{ChatMessage, ChatOptions};

/// Body of a POST to `v1/chat/completions`.
///
/// `max_tokens` and `stream` are left out of the JSON when they are zero/false, which
/// lenient backends treat as "use your default".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    /// Model identifier sent to the endpoint.
    pub model: String,

    /// The conversation, oldest first.
    pub messages: Vec<ChatMessage>,

    /// Sampling temperature, passed through unchecked.
    pub temperature: f64,

    /// Maximum tokens to generate.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub max_tokens: u32,

    /// Whether the endpoint should answer with a server-sent event stream.
    #[serde(default, skip_serializing_if = "is_false")]
    pub stream: bool,
}

impl ChatRequest {
    /// Build a request for `model` from a message list and the relevant options.
    ///
    /// The history carried by `options` is not consulted; callers assemble `messages`.
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>, options: &ChatOptions) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stream: options.stream,
        }
    }
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

fn is_false(value: &bool) -> bool {
    !*value
}
