//! Re-chunking of a streamed chat completion.
//!
//! Network chunks carry arbitrary slices of the `text/event-stream` body, so a
//! chunk may end in the middle of a UTF-8 sequence or a JSON object. The decoder
//! only parses complete lines and carries the remainder into the next chunk.

use crate::domain::ports::ByteStream;
use crate::utils::error::{RagError, Result};
use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use std::collections::VecDeque;

const DONE_MARKER: &str = "[DONE]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Delta(String),
    Error(String),
    Done,
}

#[derive(Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    error: Option<ChunkError>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Deserialize, Default)]
struct Delta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChunkError {
    message: String,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `[DONE]` has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Bytes waiting for their terminating newline.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        if self.done {
            return Vec::new();
        }

        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if let Some(event) = self.decode_line(&line[..newline]) {
                events.push(event);
                if self.done {
                    self.buffer.clear();
                    break;
                }
            }
        }
        events
    }

    /// Flushes an unterminated last line once the upstream body has ended.
    pub fn finish(&mut self) -> Vec<SseEvent> {
        if self.done || self.buffer.is_empty() {
            self.buffer.clear();
            return Vec::new();
        }

        let line = std::mem::take(&mut self.buffer);
        self.decode_line(&line).into_iter().collect()
    }

    fn decode_line(&mut self, line: &[u8]) -> Option<SseEvent> {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        let line = String::from_utf8_lossy(line);
        let line = line.trim_end();

        if line.is_empty() || line.starts_with(':') {
            return None;
        }

        let data = match line.strip_prefix("data:") {
            Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
            None if ["event:", "id:", "retry:"].iter().any(|f| line.starts_with(f)) => {
                return None;
            }
            None => line,
        };

        if data == DONE_MARKER {
            self.done = true;
            return Some(SseEvent::Done);
        }

        match serde_json::from_str::<CompletionChunk>(data) {
            Ok(chunk) => {
                if let Some(error) = chunk.error {
                    return Some(SseEvent::Error(error.message));
                }
                chunk
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.delta.content)
                    .filter(|content| !content.is_empty())
                    .map(SseEvent::Delta)
            }
            Err(e) => {
                tracing::warn!("Skipping malformed stream line ({}): {}", e, data);
                None
            }
        }
    }
}

struct Relay<S> {
    upstream: S,
    decoder: SseDecoder,
    pending: VecDeque<Result<Bytes>>,
    closed: bool,
}

impl<S> Relay<S> {
    fn absorb(&mut self, events: Vec<SseEvent>) {
        for event in events {
            match event {
                SseEvent::Delta(text) => self.pending.push_back(Ok(Bytes::from(text))),
                SseEvent::Done => self.closed = true,
                SseEvent::Error(message) => {
                    tracing::error!("Completion stream reported an error: {}", message);
                    self.pending.push_back(Err(RagError::StreamError { message }));
                    self.closed = true;
                    return;
                }
            }
        }
    }
}

/// Forwards the decoded content deltas of an SSE completion body, in order.
///
/// The stream ends at `[DONE]` or when the upstream body ends. Transport
/// failures and error events are yielded as a final `Err`.
pub fn relay_deltas<S>(upstream: S) -> impl Stream<Item = Result<Bytes>>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
{
    let relay = Relay {
        upstream,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        closed: false,
    };

    stream::unfold(relay, |mut relay| async move {
        loop {
            if let Some(item) = relay.pending.pop_front() {
                return Some((item, relay));
            }
            if relay.closed {
                return None;
            }

            match relay.upstream.next().await {
                Some(Ok(chunk)) => {
                    let events = relay.decoder.feed(&chunk);
                    relay.absorb(events);
                }
                Some(Err(e)) => {
                    tracing::error!("Completion stream failed: {}", e);
                    relay.closed = true;
                    return Some((Err(e), relay));
                }
                None => {
                    let events = relay.decoder.finish();
                    relay.absorb(events);
                    if !relay.decoder.is_done() {
                        tracing::warn!("Completion stream ended without [DONE]");
                    }
                    relay.closed = true;
                }
            }
        }
    })
}

/// Boxed form of [`relay_deltas`] for a raw completion body.
pub fn relay_body(body: ByteStream) -> ByteStream {
    Box::pin(relay_deltas(body))
}
