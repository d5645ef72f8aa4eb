//! Deterministic transport for tests and offline demos.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_stream::stream;
use async_trait::async_trait;
use bytes::Bytes;
use campchat_contracts::RelayRequest;
use tokio::time::{Duration, sleep};

use super::{ByteStream, ChatTransport};
use crate::error::{ChatError, Result};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Serve these chunks, in order, then close the stream.
    Chunks(Vec<Bytes>),
    /// Serve these chunks, then fail mid-stream.
    ChunksThenError(Vec<Bytes>, String),
    /// Refuse to open the stream with the given relay status.
    Status(u16, String),
}

impl ScriptedReply {
    pub fn chunks<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self::Chunks(chunks.into_iter().map(Into::into).collect())
    }

    /// One `data:` line per delta followed by `[DONE]`, all in a single chunk.
    pub fn deltas<'a>(deltas: impl IntoIterator<Item = &'a str>) -> Self {
        let mut body = String::new();
        for delta in deltas {
            body.push_str(&sse_delta_line(delta));
        }
        body.push_str("data: [DONE]\n\n");
        Self::Chunks(vec![Bytes::from(body)])
    }
}

/// Format a chat-completion SSE line carrying `content`.
pub fn sse_delta_line(content: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({"choices": [{"delta": {"content": content}}]})
    )
}

/// Replays scripted replies in order and records every request it saw.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    replies: Arc<Mutex<VecDeque<ScriptedReply>>>,
    requests: Arc<Mutex<Vec<RelayRequest>>>,
    chunk_delay: Duration,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            ..Self::default()
        }
    }

    /// Pause between chunks, so cancellation can land mid-stream.
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    pub fn push_reply(&self, reply: ScriptedReply) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }

    pub fn requests(&self) -> Vec<RelayRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn open_stream(&self, request: &RelayRequest) -> Result<ByteStream> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let reply = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| ScriptedReply::deltas(["mock-ok"]));

        let (chunks, failure) = match reply {
            ScriptedReply::Status(status, message) => {
                return Err(ChatError::from_status(status, message));
            }
            ScriptedReply::Chunks(chunks) => (chunks, None),
            ScriptedReply::ChunksThenError(chunks, message) => (chunks, Some(message)),
        };

        let delay = self.chunk_delay;
        let stream: ByteStream = Box::pin(stream! {
            for chunk in chunks {
                if !delay.is_zero() {
                    sleep(delay).await;
                }
                yield Ok(chunk);
            }
            if let Some(message) = failure {
                yield Err(ChatError::Transport(message));
            }
        });
        Ok(stream)
    }
}
