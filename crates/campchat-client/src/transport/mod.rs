//! Transports that open a streamed chat response.

mod relay_client;
mod scripted;

pub use relay_client::RelayClient;
pub use scripted::{ScriptedReply, ScriptedTransport, sse_delta_line};

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use campchat_contracts::RelayRequest;
use futures::Stream;

use crate::error::Result;

/// Raw response body, chunked however the network delivered it
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Opens the byte stream for one assistant reply.
///
/// A non-success response is an error from `open_stream`; failures while
/// reading come through the stream itself.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn open_stream(&self, request: &RelayRequest) -> Result<ByteStream>;
}
