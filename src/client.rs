use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client as ReqwestClient, Response};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_CANCELLED, CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS,
    CLIENT_STATUS_ERRORS,
};
use crate::render::Renderer;
use crate::sse;
use crate::types::{ChatMessage, ChatOptions, ChatRequest, ChatResponse, ModelConfig};

/// Path appended to every configured base URL.
pub const CHAT_COMPLETIONS_PATH: &str = "v1/chat/completions";

/// Overall deadline for a single chat call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Build the chat completions endpoint for a base URL.
///
/// The base is normalized to end in exactly one `/` so that `http://host` and
/// `http://host/` resolve to the same endpoint.
pub fn endpoint_url(base_url: &str) -> String {
    let mut url = base_url.trim_end_matches('/').to_string();
    url.push('/');
    url.push_str(CHAT_COMPLETIONS_PATH);
    url
}

/// Build the HTTP client shared by every model.
///
/// The client pools connections and is safe to use from many tasks at once.
pub fn http_client(timeout: Duration) -> Result<ReqwestClient> {
    ReqwestClient::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {}", e),
                Some(Box::new(e)),
            )
        })
}

/// Client for an OpenAI-compatible chat completions endpoint.
///
/// Each call to [`ChatClient::send`] makes exactly one attempt; there are no retries.
#[derive(Debug, Clone)]
pub struct ChatClient {
    model: String,
    api_key: String,
    base_url: String,
    client: ReqwestClient,
    timeout: Duration,
}

impl ChatClient {
    /// Create a client for `config` with its own connection pool and the default timeout.
    pub fn new(config: &ModelConfig) -> Result<Self> {
        Self::with_timeout(config, DEFAULT_TIMEOUT)
    }

    /// Create a client for `config` with a custom timeout.
    pub fn with_timeout(config: &ModelConfig, timeout: Duration) -> Result<Self> {
        let client = http_client(timeout)?;
        Ok(Self::with_http_client(config, client, timeout))
    }

    /// Create a client for `config` that shares an existing connection pool.
    ///
    /// `timeout` should match the one `client` was built with; it is only reported in
    /// timeout errors.
    pub fn with_http_client(config: &ModelConfig, client: ReqwestClient, timeout: Duration) -> Self {
        Self {
            model: config.name.clone(),
            api_key: config.api_key.clone(),
            base_url: config.url.clone(),
            client,
            timeout,
        }
    }

    /// The model name sent with every request.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The fully-qualified chat completions endpoint.
    pub fn endpoint(&self) -> String {
        endpoint_url(&self.base_url)
    }

    /// Send `messages` and return the assistant's answer.
    ///
    /// When `options.stream` is set the body is decoded as an event stream and each
    /// fragment goes to `renderer` as it arrives; otherwise the body is decoded as a single
    /// JSON envelope and nothing is rendered.  Cancelling `cancel` aborts the request,
    /// including a stream that is mid-read, and yields [`Error::Abort`].
    pub async fn send(
        &self,
        messages: Vec<ChatMessage>,
        options: &ChatOptions,
        cancel: &CancellationToken,
        renderer: &mut dyn Renderer,
    ) -> Result<String> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::abort("request cancelled")),
            result = self.send_once(messages, options, renderer) => result,
        };
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        if let Err(err) = &result {
            CLIENT_REQUEST_ERRORS.click();
            if err.is_abort() {
                CLIENT_CANCELLED.click();
            }
        }
        result
    }

    async fn send_once(
        &self,
        messages: Vec<ChatMessage>,
        options: &ChatOptions,
        renderer: &mut dyn Renderer,
    ) -> Result<String> {
        let request = ChatRequest::new(&self.model, messages, options);
        let body = serde_json::to_vec(&request).map_err(|e| {
            Error::serialization(
                format!("failed to serialize request: {e}"),
                Some(Box::new(e)),
            )
        })?;
        let url = Url::parse(&self.endpoint())?;
        let accept = if options.stream {
            "text/event-stream"
        } else {
            "application/json"
        };
        tracing::debug!(
            model = %self.model,
            url = %url,
            stream = options.stream,
            messages = request.messages.len(),
            "sending chat request"
        );

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, accept)
            .bearer_auth(&self.api_key)
            .body(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            CLIENT_STATUS_ERRORS.click();
            // Best effort: an unreadable body still produces a status error.
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), model = %self.model, "chat request failed");
            return Err(Error::api(status.as_u16(), body));
        }

        if options.stream {
            self.read_stream(response, renderer).await
        } else {
            self.read_envelope(response).await
        }
    }

    async fn read_stream(&self, response: Response, renderer: &mut dyn Renderer) -> Result<String> {
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("no content type")
            .to_string();
        let outcome = sse::decode_stream(response.bytes_stream(), renderer).await?;
        if outcome.saw_no_events() {
            return Err(Error::streaming(format!(
                "requested a stream but the response ({content_type}) contained no data frames"
            )));
        }
        tracing::debug!(
            frames = outcome.frames,
            skipped = outcome.skipped,
            done = outcome.done,
            "stream complete"
        );
        renderer.finish_response();
        Ok(outcome.text)
    }

    async fn read_envelope(&self, response: Response) -> Result<String> {
        let bytes = response.bytes().await.map_err(|e| self.transport_error(e))?;
        let envelope: ChatResponse = serde_json::from_slice(&bytes).map_err(|e| {
            Error::serialization(format!("failed to parse response: {e}"), Some(Box::new(e)))
        })?;
        envelope
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::empty_response("API returned no choices"))
    }

    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_normalization() {
        assert_eq!(
            endpoint_url("http://localhost:8080"),
            "http://localhost:8080/v1/chat/completions"
        );
        assert_eq!(
            endpoint_url("http://localhost:8080/"),
            endpoint_url("http://localhost:8080")
        );
        assert_eq!(
            endpoint_url("https://example.com/proxy//"),
            "https://example.com/proxy/v1/chat/completions"
        );
    }

    #[test]
    fn client_creation() {
        let config = ModelConfig::new("gpt-4o", "https://api.openai.com", "test-key");
        let client = ChatClient::new(&config).unwrap();
        assert_eq!(client.model(), "gpt-4o");
        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.timeout, DEFAULT_TIMEOUT);
        assert_eq!(
            client.endpoint(),
            "https://api.openai.com/v1/chat/completions"
        );

        let client = ChatClient::with_timeout(&config, Duration::from_secs(5)).unwrap();
        assert_eq!(client.timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn invalid_base_url_is_an_error() {
        let config = ModelConfig::new("m", "not a url", "k");
        let client = ChatClient::new(&config).unwrap();
        let err = client
            .send(
                vec![ChatMessage::user("hi")],
                &ChatOptions::default(),
                &CancellationToken::new(),
                &mut crate::render::SilentRenderer,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Url { .. }));
    }

    #[tokio::test]
    async fn cancelled_before_dispatch() {
        let config = ModelConfig::new("m", "http://127.0.0.1:9", "k");
        let client = ChatClient::new(&config).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = client
            .send(
                vec![ChatMessage::user("hi")],
                &ChatOptions::default(),
                &cancel,
                &mut crate::render::SilentRenderer,
            )
            .await
            .unwrap_err();
        assert!(err.is_abort());
        assert!(err.is_transport());
    }
}
