//! The uniform `ask` entry point over every configured backend.

use std::fmt;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::client::ChatClient;
use crate::error::Result;
use crate::render::Renderer;
use crate::types::{ChatMessage, ChatOptions, ModelConfig};

/// The family of backend that answers for a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Any endpoint speaking the OpenAI chat completions protocol.
    OpenAiCompatible,
    /// Anthropic-family models.  No wire client exists for these; answers are synthetic.
    AnthropicCompatible,
}

impl Backend {
    /// Pick the backend family for a model from its name and base URL.
    ///
    /// The name is checked first, case-insensitively; the URL only breaks the tie when the
    /// name says nothing.  Anything unrecognized is treated as OpenAI-compatible.
    pub fn classify(name: &str, url: &str) -> Backend {
        let name = name.to_lowercase();
        if name.contains("openai") || name.contains("gpt") {
            return Backend::OpenAiCompatible;
        }
        if name.contains("anthropic") || name.contains("claude") {
            return Backend::AnthropicCompatible;
        }
        if url.contains("openai.com") {
            return Backend::OpenAiCompatible;
        }
        Backend::OpenAiCompatible
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::OpenAiCompatible => "openai",
            Backend::AnthropicCompatible => "anthropic",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file supplied as context for a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContext {
    pub name: String,
    pub content: String,
}

impl FileContext {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Fold a file and a question into a single user prompt.
///
/// The template is:
///
/// ```text
/// file name: <name>
///
/// file content:
/// <content>
///
/// question: <question>
/// ```
pub fn compose_file_prompt(file: &FileContext, question: &str) -> String {
    format!(
        "file name: {}\n\nfile content:\n{}\n\nquestion: {}",
        file.name, file.content, question
    )
}

/// A configured model, ready to answer questions.
#[derive(Debug, Clone)]
pub struct Model {
    config: ModelConfig,
    backend: Backend,
    client: ChatClient,
}

impl Model {
    /// Create a model with its own HTTP client.
    pub fn new(config: ModelConfig) -> Result<Self> {
        let client = ChatClient::new(&config)?;
        Ok(Self::from_parts(config, client))
    }

    /// Create a model that shares `http` with other models.
    pub fn with_http_client(config: ModelConfig, http: reqwest::Client, timeout: Duration) -> Self {
        let client = ChatClient::with_http_client(&config, http, timeout);
        Self::from_parts(config, client)
    }

    fn from_parts(config: ModelConfig, client: ChatClient) -> Self {
        let backend = Backend::classify(&config.name, &config.url);
        Self {
            config,
            backend,
            client,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// The options a call starts from before any caller overrides.
    pub fn default_options(&self) -> ChatOptions {
        self.config.chat_options()
    }

    /// Ask a question, optionally about a file.
    ///
    /// `options.history` is sent first, in order, followed by exactly one user message.
    /// With `options.stream` set the answer has already been written to `renderer` when
    /// this returns; otherwise the caller is responsible for displaying it.
    pub async fn ask(
        &self,
        question: &str,
        file: Option<&FileContext>,
        mut options: ChatOptions,
        cancel: &CancellationToken,
        renderer: &mut dyn Renderer,
    ) -> Result<String> {
        let content = match file {
            Some(file) => compose_file_prompt(file, question),
            None => question.to_string(),
        };
        match self.backend {
            Backend::OpenAiCompatible => {
                let mut messages = std::mem::take(&mut options.history);
                messages.push(ChatMessage::user(content));
                self.client.send(messages, &options, cancel, renderer).await
            }
            Backend::AnthropicCompatible => {
                let answer = match file {
                    Some(file) => format!(
                        "[Anthropic] Response to file {} question: {}",
                        file.name, question
                    ),
                    None => format!("[Anthropic] Response to: {}", question),
                };
                tracing::debug!(model = %self.config.name, "answering with synthetic response");
                if options.stream {
                    renderer.print_text(&answer);
                    renderer.finish_response();
                }
                Ok(answer)
            }
        }
    }
}
