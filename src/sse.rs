//! Server-Sent Events (SSE) decoding for streamed chat completions.
//!
//! A streamed completion arrives as newline-delimited `data: <json>` frames, each carrying
//! a [`StreamChunk`] with a fragment of the answer, and ends with `data: [DONE]`.  This
//! module turns the raw byte stream into the concatenated answer text.
//!
//! Frames that fail to parse are skipped rather than treated as errors; only a failure of
//! the underlying read aborts decoding, and even then the text gathered so far travels
//! with the error.

use std::io;

use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use tokio_util::codec::{AnyDelimiterCodec, FramedRead};
use tokio_util::io::StreamReader;

use crate::error::{Error, Result};
use crate::observability::{STREAM_ERRORS, STREAM_FRAMES, STREAM_SKIPPED_FRAMES};
use crate::render::Renderer;
use crate::types::StreamChunk;

/// Prefix that marks a data line.
const DATA_PREFIX: &str = "data: ";

/// Payload that ends the stream.
const DONE_MARKER: &str = "[DONE]";

/// Classification of one line of an event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Blank lines, comments, `event:`/`id:` fields and anything else without the data prefix.
    Ignored,
    /// The `[DONE]` terminal marker.
    Done,
    /// A data payload that is not a valid chunk.
    Malformed(String),
    /// A parsed chunk.
    Chunk(StreamChunk),
}

/// Classify a single line of an event stream.
pub fn parse_line(line: &str) -> Frame {
    let line = line.trim_end();
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Frame::Ignored;
    };
    if payload == DONE_MARKER {
        return Frame::Done;
    }
    match serde_json::from_str::<StreamChunk>(payload) {
        Ok(chunk) => Frame::Chunk(chunk),
        Err(err) => Frame::Malformed(err.to_string()),
    }
}

/// The result of decoding a complete event stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamOutcome {
    /// Concatenated content fragments, in arrival order.
    pub text: String,
    /// Number of chunks that parsed.
    pub frames: usize,
    /// Number of data lines that did not parse.
    pub skipped: usize,
    /// Whether the `[DONE]` marker was seen.
    pub done: bool,
}

impl StreamOutcome {
    /// True if the body contained no data frame of any kind.
    pub fn saw_no_events(&self) -> bool {
        self.frames == 0 && self.skipped == 0 && !self.done
    }
}

/// Decode a byte stream of server-sent events into the answer text.
///
/// Every non-empty content fragment is handed to `renderer` as it arrives and appended to
/// the outcome.  Decoding stops at `[DONE]`; anything after it is never read.  A read
/// failure yields [`Error::StreamRead`] carrying the text accumulated before it.
pub async fn decode_stream<S, E>(byte_stream: S, renderer: &mut dyn Renderer) -> Result<StreamOutcome>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let reader = StreamReader::new(byte_stream.map(|chunk| chunk.map_err(io::Error::other)));
    // Lines are split as raw bytes; bad UTF-8 in one frame must not end the stream.
    let lines = FramedRead::new(reader, AnyDelimiterCodec::new(b"\n".to_vec(), Vec::new()));
    futures::pin_mut!(lines);

    let mut outcome = StreamOutcome::default();
    while let Some(line) = lines.next().await {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                STREAM_ERRORS.click();
                return Err(Error::stream_read(
                    format!("error reading stream response: {err}"),
                    outcome.text,
                    Some(Box::new(err)),
                ));
            }
        };
        match parse_line(&String::from_utf8_lossy(&line)) {
            Frame::Ignored => {}
            Frame::Done => {
                outcome.done = true;
                break;
            }
            Frame::Malformed(reason) => {
                STREAM_SKIPPED_FRAMES.click();
                tracing::debug!(%reason, "skipping malformed stream frame");
                outcome.skipped += 1;
            }
            Frame::Chunk(chunk) => {
                STREAM_FRAMES.click();
                outcome.frames += 1;
                if let Some(content) = chunk.content() {
                    renderer.print_text(content);
                    outcome.text.push_str(content);
                }
            }
        }
    }
    Ok(outcome)
}
