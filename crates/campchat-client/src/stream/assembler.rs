//! Accumulates assistant text from a streamed chat-completion response.

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use super::decoder::Utf8Decoder;
use super::sse::{SseDecoder, StreamFrame};
use crate::error::Result;
use crate::transport::ByteStream;

/// How an assembled stream came to an end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The `[DONE]` sentinel arrived
    Done,
    /// The transport closed without `[DONE]`
    Closed,
    /// The caller cancelled before the stream ended
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembled {
    pub text: String,
    pub end: StreamEnd,
    /// Malformed lines dropped along the way
    pub dropped_lines: usize,
}

/// Incremental state for one response: bytes in, growing text out.
#[derive(Debug, Default)]
pub struct ResponseAssembler {
    utf8: Utf8Decoder,
    sse: SseDecoder,
    text: String,
}

impl ResponseAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_decoder(sse: SseDecoder) -> Self {
        Self {
            sse,
            ..Self::default()
        }
    }

    /// Feed one network chunk. `on_content` receives the full text once per
    /// delta the chunk completed.
    pub fn feed(&mut self, chunk: &[u8], mut on_content: impl FnMut(&str)) {
        if self.sse.is_done() {
            return;
        }
        let decoded = self.utf8.decode(chunk);
        self.apply(&decoded, &mut on_content);
    }

    /// The stream ended: flush a truncated character, then every line still
    /// held back waiting for a retry.
    pub fn finish(&mut self, mut on_content: impl FnMut(&str)) {
        if self.sse.is_done() {
            return;
        }
        let tail = self.utf8.finish();
        if !tail.is_empty() {
            self.apply(&tail, &mut on_content);
        }
        let frames = self.sse.finish();
        self.emit(frames, &mut on_content);
    }

    fn apply(&mut self, decoded: &str, on_content: &mut impl FnMut(&str)) {
        let frames = self.sse.push(decoded);
        self.emit(frames, on_content);
    }

    fn emit(&mut self, frames: Vec<StreamFrame>, on_content: &mut impl FnMut(&str)) {
        for frame in frames {
            match frame {
                StreamFrame::Delta(delta) => {
                    self.text.push_str(&delta);
                    on_content(&self.text);
                }
                StreamFrame::Done => {}
            }
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_done(&self) -> bool {
        self.sse.is_done()
    }

    pub fn dropped_lines(&self) -> usize {
        self.sse.dropped_lines()
    }

    fn into_assembled(self, end: StreamEnd) -> Assembled {
        Assembled {
            dropped_lines: self.sse.dropped_lines(),
            text: self.text,
            end,
        }
    }
}

/// Read `stream` to the end, reporting the accumulated text after every
/// delta.
///
/// The stream is consumed and dropped on every return path. After `[DONE]`
/// the transport is still drained so the connection closes cleanly; a read
/// error at that point no longer affects the result.
pub async fn assemble(
    mut stream: ByteStream,
    cancel: &CancellationToken,
    mut on_content: impl FnMut(&str),
) -> Result<Assembled> {
    let mut assembler = ResponseAssembler::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(chars = assembler.text().len(), "Stream cancelled");
                return Ok(assembler.into_assembled(StreamEnd::Cancelled));
            }
            next = stream.next() => next,
        };

        match next {
            Some(Ok(chunk)) => assembler.feed(&chunk, &mut on_content),
            Some(Err(err)) if assembler.is_done() => {
                tracing::debug!(error = %err, "Ignoring read error after [DONE]");
                break;
            }
            Some(Err(err)) => return Err(err),
            None => break,
        }
    }

    assembler.finish(&mut on_content);
    let end = if assembler.is_done() {
        StreamEnd::Done
    } else {
        StreamEnd::Closed
    };
    Ok(assembler.into_assembled(end))
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use futures::stream;

    use super::*;
    use crate::error::ChatError;
    use crate::transport::sse_delta_line;

    fn byte_stream(chunks: Vec<&'static str>) -> ByteStream {
        Box::pin(stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok(Bytes::from_static(c.as_bytes()))),
        ))
    }

    fn owned_stream(chunks: Vec<Vec<u8>>) -> ByteStream {
        Box::pin(stream::iter(chunks.into_iter().map(|c| Ok(Bytes::from(c)))))
    }

    #[tokio::test]
    async fn accumulates_hi_there() {
        let stream = byte_stream(vec![
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\" there\"}}]}\n",
            "data: [DONE]\n",
        ]);
        let mut seen = Vec::new();

        let assembled = assemble(stream, &CancellationToken::new(), |text| {
            seen.push(text.to_string())
        })
        .await
        .unwrap();

        assert_eq!(assembled.text, "Hi there");
        assert_eq!(assembled.end, StreamEnd::Done);
        assert_eq!(seen, vec!["Hi", "Hi there"]);
    }

    #[tokio::test]
    async fn one_callback_per_delta_within_a_chunk() {
        let body = format!("{}{}{}", sse_delta_line("a"), sse_delta_line("b"), sse_delta_line("c"));
        let mut seen = Vec::new();

        assemble(
            owned_stream(vec![body.into_bytes()]),
            &CancellationToken::new(),
            |text| seen.push(text.to_string()),
        )
        .await
        .unwrap();

        assert_eq!(seen, vec!["a", "ab", "abc"]);
    }

    #[tokio::test]
    async fn splitting_at_any_byte_yields_same_text() {
        let body = format!(
            "{}: ping\n\n{}data: [DONE]\n\n",
            sse_delta_line("SplashFun costs ₹2,500 "),
            sse_delta_line("👋 see you")
        )
        .into_bytes();

        for cut in 0..=body.len() {
            let chunks = vec![body[..cut].to_vec(), body[cut..].to_vec()];
            let assembled = assemble(owned_stream(chunks), &CancellationToken::new(), |_| {})
                .await
                .unwrap();
            assert_eq!(
                assembled.text, "SplashFun costs ₹2,500 👋 see you",
                "cut at {}",
                cut
            );
        }
    }

    #[tokio::test]
    async fn comments_and_blank_lines_add_nothing() {
        let stream = byte_stream(vec![": heartbeat\n\n\n: another\r\n"]);
        let mut calls = 0;

        let assembled = assemble(stream, &CancellationToken::new(), |_| calls += 1)
            .await
            .unwrap();

        assert_eq!(assembled.text, "");
        assert_eq!(assembled.end, StreamEnd::Closed);
        assert_eq!(calls, 0);
    }

    #[tokio::test]
    async fn close_without_done_is_success() {
        let body = sse_delta_line("partial but fine");
        let assembled = assemble(
            owned_stream(vec![body.into_bytes()]),
            &CancellationToken::new(),
            |_| {},
        )
        .await
        .unwrap();

        assert_eq!(assembled.text, "partial but fine");
        assert_eq!(assembled.end, StreamEnd::Closed);
    }

    #[tokio::test]
    async fn bytes_after_done_are_ignored() {
        let body = format!("{}data: [DONE]\n\n", sse_delta_line("final"));
        let trailing = sse_delta_line(" ghost");
        let assembled = assemble(
            owned_stream(vec![body.into_bytes(), trailing.into_bytes()]),
            &CancellationToken::new(),
            |_| {},
        )
        .await
        .unwrap();

        assert_eq!(assembled.text, "final");
        assert_eq!(assembled.end, StreamEnd::Done);
    }

    #[tokio::test]
    async fn transport_error_is_returned() {
        let stream: ByteStream = Box::pin(stream::iter(vec![
            Ok(Bytes::from(sse_delta_line("Hel"))),
            Err(ChatError::Transport("connection reset".to_string())),
        ]));
        let mut seen = Vec::new();

        let result = assemble(stream, &CancellationToken::new(), |text| {
            seen.push(text.to_string())
        })
        .await;

        assert!(matches!(result, Err(ChatError::Transport(_))));
        assert_eq!(seen, vec!["Hel"]);
    }

    #[tokio::test]
    async fn error_after_done_still_completes() {
        let stream: ByteStream = Box::pin(stream::iter(vec![
            Ok(Bytes::from(format!("{}data: [DONE]\n\n", sse_delta_line("ok")))),
            Err(ChatError::Transport("reset during close".to_string())),
        ]));

        let assembled = assemble(stream, &CancellationToken::new(), |_| {})
            .await
            .unwrap();
        assert_eq!(assembled.text, "ok");
        assert_eq!(assembled.end, StreamEnd::Done);
    }

    #[tokio::test]
    async fn never_parseable_line_does_not_stall() {
        let chunks = vec![
            b"data: {\"choices\":[{\"delta\":\n".to_vec(),
            sse_delta_line("a").into_bytes(),
            sse_delta_line("b").into_bytes(),
            sse_delta_line("c").into_bytes(),
            sse_delta_line("d").into_bytes(),
            b"data: [DONE]\n".to_vec(),
        ];

        let assembled = assemble(owned_stream(chunks), &CancellationToken::new(), |_| {})
            .await
            .unwrap();

        assert_eq!(assembled.dropped_lines, 1);
        assert_eq!(assembled.end, StreamEnd::Done);
        assert_eq!(assembled.text, "abcd");
    }

    #[tokio::test]
    async fn lines_behind_a_broken_line_survive_stream_close() {
        let body = format!(
            "data: {{broken\n{}{}data: [DONE]\n",
            sse_delta_line("Hi"),
            sse_delta_line(" there")
        );
        let mut seen = Vec::new();

        let assembled = assemble(
            owned_stream(vec![body.into_bytes()]),
            &CancellationToken::new(),
            |text| seen.push(text.to_string()),
        )
        .await
        .unwrap();

        assert_eq!(assembled.text, "Hi there");
        assert_eq!(assembled.end, StreamEnd::Done);
        assert_eq!(assembled.dropped_lines, 1);
        assert_eq!(seen, vec!["Hi", "Hi there"]);
    }

    #[tokio::test]
    async fn cancelled_before_first_read() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let assembled = assemble(byte_stream(vec!["data: [DONE]\n"]), &cancel, |_| {})
            .await
            .unwrap();

        assert_eq!(assembled.end, StreamEnd::Cancelled);
        assert_eq!(assembled.text, "");
    }
}
