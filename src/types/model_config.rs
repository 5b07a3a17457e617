use serde::{Deserialize, Serialize};

use crate::types::ChatOptions;

/// Credentials and endpoint for one configured model.
///
/// The registry owns these; chat calls receive a copy and never write it back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    /// Model name, also sent as the `model` field of each request.
    pub name: String,

    /// Base URL of the endpoint, without the `v1/chat/completions` suffix.
    pub url: String,

    /// Bearer token.
    pub api_key: String,

    /// Whether this model is the default.
    #[serde(default)]
    pub default_enabled: bool,

    /// Chat options used when the caller does not override them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_chat_options: Option<ChatOptions>,
}

impl ModelConfig {
    /// Create a new `ModelConfig` with no saved chat options.
    pub fn new(name: impl Into<String>, url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            api_key: api_key.into(),
            default_enabled: false,
            default_chat_options: None,
        }
    }

    /// Marks this model as the default.
    pub fn with_default_enabled(mut self, default_enabled: bool) -> Self {
        self.default_enabled = default_enabled;
        self
    }

    /// Sets the saved chat options.
    pub fn with_chat_options(mut self, options: Option<ChatOptions>) -> Self {
        self.default_chat_options = options;
        self
    }

    /// The chat options a call starts from: the saved ones, or the global defaults.
    pub fn chat_options(&self) -> ChatOptions {
        self.default_chat_options.clone().unwrap_or_default()
    }
}
