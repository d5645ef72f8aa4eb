//! Upstream chat-completion gateway client

use campchat_contracts::ChatMessage;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;

use crate::config::{GATEWAY_API_KEY_ENV, RelayConfig};
use crate::error::{RelayError, Result};
use crate::http_client::build_http_client;

// Upstream bodies can be large or carry provider internals; logs keep a prefix only.
const MAX_ERROR_BODY: usize = 512;

#[derive(Serialize)]
struct GatewayRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Clone)]
pub struct GatewayClient {
    http_client: Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl GatewayClient {
    pub fn new(config: &RelayConfig) -> Result<Self> {
        Ok(Self {
            http_client: build_http_client()?,
            url: config.gateway_url.clone(),
            model: config.model.clone(),
            api_key: config.gateway_api_key.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Open a streaming completion. A successful response is handed back
    /// untouched so its body can be piped to the caller.
    pub async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<Response> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            RelayError::Configuration(format!("{} is not configured", GATEWAY_API_KEY_ENV))
        })?;

        let body = GatewayRequest {
            model: &self.model,
            messages,
            stream: true,
        };

        let response = self
            .http_client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(response);
        }

        Err(response_to_error(response).await)
    }
}

async fn response_to_error(response: Response) -> RelayError {
    match response.status() {
        StatusCode::TOO_MANY_REQUESTS => return RelayError::RateLimited,
        StatusCode::PAYMENT_REQUIRED => return RelayError::PaymentRequired,
        _ => {}
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let body = truncate_body(body);
    tracing::error!(status, body = %body, "AI gateway error");

    RelayError::Upstream { status, body }
}

fn truncate_body(body: String) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body;
    }
    let mut cut = MAX_ERROR_BODY;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}... [truncated]", &body[..cut])
}
