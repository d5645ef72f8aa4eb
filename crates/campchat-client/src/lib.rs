//! CampChat Client - consumes the relay's streamed replies.
//!
//! This crate provides:
//! - An incremental assembler turning SSE chat-completion bytes into text
//! - A chat session that keeps the conversation and its in-flight turn
//! - Transports: the HTTP relay client and a scripted stand-in for tests
//! - A terminal renderer for the `campchat` binary

pub mod error;
mod http_client;
pub mod render;
pub mod session;
pub mod stream;
pub mod transport;

pub use error::{ChatError, ErrorKind, FramingError, Result};
pub use render::TerminalRenderer;
pub use session::{
    ChatSession, ConversationTurn, FALLBACK_MESSAGE, GREETING, SendOutcome, SessionState, TurnId,
};
pub use stream::{Assembled, ResponseAssembler, StreamEnd, assemble};
pub use transport::{ByteStream, ChatTransport, RelayClient, ScriptedReply, ScriptedTransport};
