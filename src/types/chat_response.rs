use serde::{Deserialize, Serialize};

use crate::types::ChatMessage;

/// Token accounting reported by the endpoint.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    /// Tokens in the prompt.
    #[serde(default)]
    pub prompt_tokens: u64,

    /// Tokens in the completion.
    #[serde(default)]
    pub completion_tokens: u64,

    /// Sum of prompt and completion tokens.
    #[serde(default)]
    pub total_tokens: u64,
}

/// One candidate answer in a non-streaming response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Choice {
    /// Position of this choice.
    #[serde(default)]
    pub index: u32,

    /// The assistant message.
    pub message: ChatMessage,

    /// Why generation stopped.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// The JSON envelope of a non-streaming chat completion.
///
/// Only `choices` is required; the metadata fields default when a backend omits them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    /// Response identifier.
    #[serde(default)]
    pub id: String,

    /// Object type, normally `chat.completion`.
    #[serde(default)]
    pub object: String,

    /// Unix timestamp of creation.
    #[serde(default)]
    pub created: i64,

    /// Model that produced the response.
    #[serde(default)]
    pub model: String,

    /// Candidate answers; termai always reads the first.
    pub choices: Vec<Choice>,

    /// Token usage.
    #[serde(default)]
    pub usage: Usage,
}

impl ChatResponse {
    /// The content of the first choice, if there is one.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .map(|choice| choice.message.content.as_str())
    }
}
