//! Incremental parser for `data:` framed chat-completion streams.

use super::error::transport_error;
use super::normalize::chunk_to_responses;
use super::types::ChatCompletionResponse;
use crate::llm::diagnostics::{DiagnosticEvent, Diagnostics};
use crate::llm::types::LlmResponse;
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::sync::Arc;

const DATA_PREFIX: &str = "data: ";
const DONE_MARKER: &str = "[DONE]";

/// Reassembles newline-terminated lines across arbitrary chunk boundaries.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    buffer: BytesMut,
    // Bytes of `buffer` already known to hold no newline.
    scanned: usize,
}

impl SseLineBuffer {
    /// Append `chunk` and return every line it completed. The trailing
    /// partial line stays buffered.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(offset) = self.buffer[self.scanned..].iter().position(|&b| b == b'\n') {
            let pos = self.scanned + offset;
            let raw = self.buffer.split_to(pos + 1);
            lines.push(decode_line(&raw[..pos]));
            self.scanned = 0;
        }
        self.scanned = self.buffer.len();
        lines
    }

    /// Whatever is left once the body has ended, if anything.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let raw = self.buffer.split();
        self.scanned = 0;
        Some(decode_line(&raw))
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Classification of one stream line.
#[derive(Debug)]
pub enum SseLine {
    /// Not a `data: ` line (comments, `event:`, blank separators).
    Ignored,
    /// The `[DONE]` terminator.
    Done,
    /// A `data: ` payload that is not a chat-completion chunk.
    Malformed { payload: String, reason: String },
    Chunk(ChatCompletionResponse),
}

pub fn parse_sse_line(line: &str) -> SseLine {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return SseLine::Ignored;
    };

    if payload.trim() == DONE_MARKER {
        return SseLine::Done;
    }

    match serde_json::from_str::<ChatCompletionResponse>(payload) {
        Ok(chunk) => SseLine::Chunk(chunk),
        Err(e) => SseLine::Malformed {
            payload: payload.to_string(),
            reason: e.to_string(),
        },
    }
}

enum LineOutcome {
    Skip,
    Done,
    Emit(Vec<LlmResponse>),
}

fn handle_line(line: &str, diagnostics: &dyn Diagnostics) -> LineOutcome {
    match parse_sse_line(line) {
        SseLine::Ignored => LineOutcome::Skip,
        SseLine::Done => LineOutcome::Done,
        SseLine::Malformed { payload, reason } => {
            diagnostics.record(DiagnosticEvent::MalformedFrame { payload, reason });
            LineOutcome::Skip
        }
        SseLine::Chunk(chunk) => LineOutcome::Emit(chunk_to_responses(chunk, diagnostics)),
    }
}

/// Turn a response body into a lazy sequence of [`LlmResponse`]s.
///
/// Each body chunk is read only when the consumer asks for more. The
/// sequence ends at `[DONE]` or at the end of the body; a read error ends it
/// with a single `LITELLM_ERROR` response.
pub fn parse_event_stream<S, E>(
    mut body: S,
    diagnostics: Arc<dyn Diagnostics>,
) -> impl Stream<Item = LlmResponse> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + Unpin + 'static,
    E: Display + Send + 'static,
{
    async_stream::stream! {
        let mut lines = SseLineBuffer::default();
        let mut frames = 0usize;
        let mut saw_done = false;

        'read: while let Some(item) = body.next().await {
            let chunk = match item {
                Ok(chunk) => chunk,
                Err(e) => {
                    let message = e.to_string();
                    diagnostics.record(DiagnosticEvent::Failure {
                        code: super::error::TRANSPORT_ERROR_CODE.to_string(),
                        message: message.clone(),
                    });
                    yield transport_error(message);
                    return;
                }
            };

            for line in lines.push(&chunk) {
                match handle_line(&line, diagnostics.as_ref()) {
                    LineOutcome::Skip => {}
                    LineOutcome::Done => {
                        saw_done = true;
                        break 'read;
                    }
                    LineOutcome::Emit(responses) => {
                        frames += 1;
                        for response in responses {
                            yield response;
                        }
                    }
                }
            }
        }

        if !saw_done {
            if let Some(line) = lines.finish() {
                match handle_line(&line, diagnostics.as_ref()) {
                    LineOutcome::Emit(responses) => {
                        frames += 1;
                        for response in responses {
                            yield response;
                        }
                    }
                    LineOutcome::Done => saw_done = true,
                    LineOutcome::Skip => {}
                }
            }
        }

        diagnostics.record(DiagnosticEvent::StreamEnd { frames, saw_done });
    }
}
