//! `POST /chat`: forward a conversation to the gateway and pipe the SSE
//! stream back verbatim.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use campchat_contracts::{ChatMessage, RelayRequest};
use futures::TryStreamExt;
use uuid::Uuid;

use super::RelayState;
use crate::error::{RelayError, Result};

pub async fn chat(State(state): State<RelayState>, body: Bytes) -> Response {
    let request_id = Uuid::new_v4();
    match relay_chat(&state, request_id, &body).await {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(
                request_id = %request_id,
                kind = err.kind(),
                error = %err,
                "chat relay failed"
            );
            err.into_response()
        }
    }
}

async fn relay_chat(state: &RelayState, request_id: Uuid, body: &[u8]) -> Result<Response> {
    let request: RelayRequest = serde_json::from_slice(body)
        .map_err(|err| RelayError::InvalidRequest(format!("Invalid request body: {}", err)))?;

    if request.system_message().is_some() {
        return Err(RelayError::InvalidRequest(
            "System messages are supplied by the relay".to_string(),
        ));
    }

    let messages = with_system_prompt(&state.system_prompt, request.messages);
    tracing::debug!(
        request_id = %request_id,
        turns = messages.len() - 1,
        model = state.gateway.model(),
        "Forwarding conversation to gateway"
    );

    let upstream = state.gateway.stream_chat(&messages).await?;

    let stream = upstream.bytes_stream().inspect_err(move |err| {
        tracing::warn!(request_id = %request_id, error = %err, "Upstream stream interrupted");
    });

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/event-stream")],
        Body::from_stream(stream),
    )
        .into_response())
}

fn with_system_prompt(system_prompt: &str, conversation: Vec<ChatMessage>) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(conversation.len() + 1);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(conversation);
    messages
}
