use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

use crate::api::RelayState;
use crate::error::RelayError;

/// Bearer tokens browsers may present. Only SHA-256 digests are kept.
#[derive(Debug, Default)]
pub struct ClientTokens {
    hashes: HashSet<String>,
}

impl ClientTokens {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let hashes = tokens
            .into_iter()
            .map(|token| token.as_ref().trim().to_string())
            .filter(|token| !token.is_empty())
            .map(|token| hash_token(&token))
            .collect();
        Self { hashes }
    }

    pub fn is_open(&self) -> bool {
        self.hashes.is_empty()
    }

    pub fn validate(&self, token: &str) -> bool {
        self.hashes.contains(&hash_token(token))
    }
}

fn hash_token(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

pub async fn require_bearer(State(state): State<RelayState>, req: Request, next: Next) -> Response {
    if state.client_tokens.is_open() {
        return next.run(req).await;
    }

    let token = match extract_bearer(req.headers().get(axum::http::header::AUTHORIZATION)) {
        Some(token) => token,
        None => return RelayError::Unauthorized.into_response(),
    };

    if state.client_tokens.validate(&token) {
        return next.run(req).await;
    }

    tracing::warn!(path = %req.uri().path(), "Rejected chat request with unknown bearer token");
    RelayError::Unauthorized.into_response()
}

fn extract_bearer(header: Option<&HeaderValue>) -> Option<String> {
    let value = header?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(|token| token.trim().to_string())
}
