use serde::{Deserialize, Serialize};

/// Incremental fragment of an assistant message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Delta {
    /// Role marker, normally present only on the first chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// A piece of the answer text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// One choice inside a streaming chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkChoice {
    /// Position of this choice.
    #[serde(default)]
    pub index: u32,

    /// The fragment carried by this chunk.
    #[serde(default)]
    pub delta: Delta,

    /// Set on the last content-bearing chunk.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// The payload of one `data:` frame in a streaming chat completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamChunk {
    /// Response identifier, shared by all chunks of one answer.
    #[serde(default)]
    pub id: String,

    /// Object type, normally `chat.completion.chunk`.
    #[serde(default)]
    pub object: String,

    /// Unix timestamp of creation.
    #[serde(default)]
    pub created: i64,

    /// Model that produced the chunk.
    #[serde(default)]
    pub model: String,

    /// Choices carried by this chunk.
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

impl StreamChunk {
    /// The non-empty text fragment of the first choice, if any.
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
            .filter(|content| !content.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_chunk() {
        let chunk: StreamChunk = serde_json::from_str(
            r#"{"id":"chatcmpl-123","object":"chat.completion.chunk","created":1677858242,"model":"gpt-3.5-turbo-0613","choices":[{"index":0,"delta":{"content":"这是"},"finish_reason":null}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.content(), Some("这是"));
        assert_eq!(chunk.choices[0].finish_reason, None);
    }

    #[test]
    fn role_only_chunk_has_no_content() {
        let chunk: StreamChunk = serde_json::from_str(
            r#"{"choices":[{"index":0,"delta":{"role":"assistant"},"finish_reason":null}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.choices[0].delta.role.as_deref(), Some("assistant"));
        assert_eq!(chunk.content(), None);
    }

    #[test]
    fn finish_chunk_has_no_content() {
        let chunk: StreamChunk = serde_json::from_str(
            r#"{"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.content(), None);
        assert_eq!(chunk.choices[0].finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn empty_choices() {
        let chunk: StreamChunk = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(chunk.content(), None);
    }
}
