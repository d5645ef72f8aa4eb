//! Server-sent-event framing for chat-completion streams.
//!
//! Lines look like `data: {"choices":[{"delta":{"content":"..."}}]}` and the
//! stream ends with `data: [DONE]`. Framing is done here on raw text rather
//! than by a transport library so partially delivered lines can be held back.

use serde_json::Value;

use crate::error::FramingError;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// How often an unparseable line is pushed back before it is dropped
pub const MAX_LINE_RETRIES: u32 = 3;
/// Largest unterminated line kept while waiting for its newline
pub const MAX_PENDING_LINE_BYTES: usize = 64 * 1024;

/// One decoded unit of the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    /// Incremental assistant text
    Delta(String),
    /// The `[DONE]` sentinel
    Done,
}

#[derive(Debug)]
struct RetryState {
    line: String,
    attempts: u32,
}

#[derive(Debug)]
pub struct SseDecoder {
    buffer: String,
    retry: Option<RetryState>,
    done: bool,
    max_retries: u32,
    max_pending_bytes: usize,
    dropped: usize,
    last_error: Option<FramingError>,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::new(MAX_LINE_RETRIES, MAX_PENDING_LINE_BYTES)
    }
}

impl SseDecoder {
    pub fn new(max_retries: u32, max_pending_bytes: usize) -> Self {
        Self {
            buffer: String::new(),
            retry: None,
            done: false,
            max_retries,
            max_pending_bytes,
            dropped: 0,
            last_error: None,
        }
    }

    /// Append decoded text and return every frame that became complete.
    ///
    /// After `[DONE]` further input is accepted and ignored.
    pub fn push(&mut self, text: &str) -> Vec<StreamFrame> {
        if self.done {
            return Vec::new();
        }
        self.buffer.push_str(text);

        let frames = self.extract(false);
        self.enforce_pending_limit();
        frames
    }

    /// The transport closed. A line still waiting for a retry is dropped and
    /// the complete lines queued behind it are decoded.
    pub fn finish(&mut self) -> Vec<StreamFrame> {
        if self.done {
            return Vec::new();
        }
        let frames = self.extract(true);
        if !self.done && !self.buffer.is_empty() {
            tracing::debug!(
                bytes = self.buffer.len(),
                "Stream closed with an unterminated line"
            );
            self.buffer.clear();
        }
        frames
    }

    fn extract(&mut self, at_end: bool) -> Vec<StreamFrame> {
        let mut frames = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            let mut line: String = self.buffer.drain(..=newline).collect();
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }

            if line.starts_with(':') || line.trim().is_empty() {
                continue;
            }
            let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
                continue;
            };
            let payload = payload.trim();

            if payload == DONE_SENTINEL {
                self.done = true;
                self.retry = None;
                self.buffer.clear();
                frames.push(StreamFrame::Done);
                break;
            }

            match serde_json::from_str::<Value>(payload) {
                Ok(value) => {
                    self.retry = None;
                    if let Some(delta) = delta_content(&value) {
                        frames.push(StreamFrame::Delta(delta));
                    }
                }
                Err(_) if at_end => self.give_up(&line),
                Err(err) => {
                    if self.should_retry(&line) {
                        tracing::trace!(error = %err, "Re-buffering incomplete SSE line");
                        self.buffer.insert(0, '\n');
                        self.buffer.insert_str(0, &line);
                        break;
                    }
                }
            }
        }
        frames
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Bytes of text waiting for a newline (or a retry)
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    /// Lines given up on so far
    pub fn dropped_lines(&self) -> usize {
        self.dropped
    }

    pub fn last_error(&self) -> Option<&FramingError> {
        self.last_error.as_ref()
    }

    fn should_retry(&mut self, line: &str) -> bool {
        let attempts = match &self.retry {
            Some(state) if state.line == line => state.attempts + 1,
            _ => 1,
        };

        if attempts <= self.max_retries {
            self.retry = Some(RetryState {
                line: line.to_string(),
                attempts,
            });
            return true;
        }

        self.give_up(line);
        false
    }

    fn give_up(&mut self, line: &str) {
        let retries = match self.retry.take() {
            Some(state) if state.line == line => state.attempts,
            _ => 0,
        };
        self.record(FramingError::RetriesExhausted {
            retries,
            bytes: line.len(),
        });
    }

    fn enforce_pending_limit(&mut self) {
        if self.buffer.contains('\n') || self.buffer.len() <= self.max_pending_bytes {
            return;
        }
        let bytes = self.buffer.len();
        self.buffer.clear();
        self.retry = None;
        self.record(FramingError::LineTooLong {
            limit: self.max_pending_bytes,
            bytes,
        });
    }

    fn record(&mut self, error: FramingError) {
        tracing::warn!(error = %error, "Dropping malformed SSE input");
        self.dropped += 1;
        self.last_error = Some(error);
    }
}

fn delta_content(value: &Value) -> Option<String> {
    value
        .pointer("/choices/0/delta/content")
        .and_then(Value::as_str)
        .filter(|content| !content.is_empty())
        .map(String::from)
}
