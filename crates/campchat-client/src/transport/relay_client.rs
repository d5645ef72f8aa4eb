use async_trait::async_trait;
use campchat_contracts::{ErrorBody, RelayRequest};
use futures::TryStreamExt;
use reqwest::{Client, Response};

use super::{ByteStream, ChatTransport};
use crate::error::{ChatError, Result};
use crate::http_client::build_http_client;

/// HTTP transport talking to the relay's `POST /chat`
#[derive(Debug, Clone)]
pub struct RelayClient {
    http_client: Client,
    url: String,
    token: Option<String>,
}

impl RelayClient {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Result<Self> {
        Ok(Self {
            http_client: build_http_client()?,
            url: url.into(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ChatTransport for RelayClient {
    async fn open_stream(&self, request: &RelayRequest) -> Result<ByteStream> {
        let mut builder = self.http_client.post(&self.url).json(request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            return Err(response_to_error(response).await);
        }

        tracing::debug!(url = %self.url, "Relay stream opened");
        let stream: ByteStream = Box::pin(
            response
                .bytes_stream()
                .map_err(|e| ChatError::Transport(format!("Stream error: {}", e))),
        );
        Ok(stream)
    }
}

/// The relay answers failures with `{"error": "..."}`; fall back to the
/// status text when the body is something else.
async fn response_to_error(response: Response) -> ChatError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|body| body.error)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });

    tracing::warn!(status = status.as_u16(), error = %message, "Relay rejected chat request");
    ChatError::from_status(status.as_u16(), message)
}
