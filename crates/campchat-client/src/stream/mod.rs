//! Streamed response decoding: bytes to UTF-8, UTF-8 to SSE frames, frames
//! to the growing assistant text.

mod assembler;
mod decoder;
mod sse;

pub use assembler::{Assembled, ResponseAssembler, StreamEnd, assemble};
pub use decoder::Utf8Decoder;
pub use sse::{MAX_LINE_RETRIES, MAX_PENDING_LINE_BYTES, SseDecoder, StreamFrame};
