//! Conversation state for one chat window.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use campchat_contracts::{ChatMessage, RelayRequest, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::ErrorKind;
use crate::stream::{StreamEnd, assemble};
use crate::transport::ChatTransport;

/// First assistant turn of every conversation.
pub const GREETING: &str = "Hi there! 👋 I'm your Summer Camp assistant. Ask me anything about our camps, pricing, or registration!";

/// Assistant turn shown in place of a failed reply.
pub const FALLBACK_MESSAGE: &str = "Sorry, I'm having trouble connecting. Please try again!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnId(Uuid);

impl TurnId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: TurnId,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: TurnId::new(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn to_message(&self) -> ChatMessage {
        ChatMessage {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// Request sent, stream not open yet
    Sending,
    /// Assistant turn is being filled in
    Streaming,
    /// Last send failed; accepts the next send like `Idle`
    Failed(ErrorKind),
}

impl SessionState {
    pub fn is_busy(self) -> bool {
        matches!(self, SessionState::Sending | SessionState::Streaming)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input or a turn already in flight
    Ignored,
    Completed(TurnId),
    Failed(ErrorKind),
    /// Cancelled mid-stream; the turn keeps whatever text had arrived
    Cancelled(TurnId),
}

#[derive(Debug)]
struct SessionInner {
    open: bool,
    input: String,
    turns: Vec<ConversationTurn>,
    state: SessionState,
}

/// A single conversation: the open flag, the pending input and the turns.
///
/// All methods take `&self`, so a session can be shared between the task
/// that sends and the one that renders. Only one send is in flight at a
/// time; a second concurrent `send` returns [`SendOutcome::Ignored`].
#[derive(Debug)]
pub struct ChatSession {
    inner: Mutex<SessionInner>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    /// A closed session holding only the greeting.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SessionInner {
                open: false,
                input: String::new(),
                turns: vec![ConversationTurn::new(Role::Assistant, GREETING)],
                state: SessionState::Idle,
            }),
        }
    }

    pub fn open(&self) {
        self.lock().open = true;
    }

    pub fn close(&self) {
        self.lock().open = false;
    }

    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    pub fn set_input(&self, input: impl Into<String>) {
        self.lock().input = input.into();
    }

    pub fn input(&self) -> String {
        self.lock().input.clone()
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    pub fn turns(&self) -> Vec<ConversationTurn> {
        self.lock().turns.clone()
    }

    pub fn turn(&self, id: TurnId) -> Option<ConversationTurn> {
        self.lock().turns.iter().find(|t| t.id == id).cloned()
    }

    pub async fn send(
        &self,
        transport: &dyn ChatTransport,
        on_render: impl FnMut(&ConversationTurn),
    ) -> SendOutcome {
        self.send_with_cancel(transport, CancellationToken::new(), on_render)
            .await
    }

    /// Send the pending input and stream the assistant reply into the
    /// conversation.
    ///
    /// Exactly one user turn and one assistant turn are appended per accepted
    /// send. On failure the partial reply is replaced by [`FALLBACK_MESSAGE`].
    /// Errors never escape; the outcome says what happened.
    pub async fn send_with_cancel(
        &self,
        transport: &dyn ChatTransport,
        cancel: CancellationToken,
        mut on_render: impl FnMut(&ConversationTurn),
    ) -> SendOutcome {
        let Some(request) = self.begin_send() else {
            return SendOutcome::Ignored;
        };
        let mut in_flight = InFlight {
            session: self,
            armed: true,
        };

        let stream = match transport.open_stream(&request).await {
            Ok(stream) => stream,
            Err(err) => {
                tracing::warn!(error = %err, kind = err.kind().as_str(), "Chat request failed");
                in_flight.disarm();
                return self.fail(None, err.kind(), &mut on_render);
            }
        };

        let turn_id = {
            let mut inner = self.lock();
            let turn = ConversationTurn::new(Role::Assistant, String::new());
            let id = turn.id;
            inner.turns.push(turn);
            inner.state = SessionState::Streaming;
            id
        };

        let result = assemble(stream, &cancel, |text| {
            if let Some(turn) = self.replace_content(turn_id, text) {
                on_render(&turn);
            }
        })
        .await;
        in_flight.disarm();

        match result {
            Ok(assembled) => {
                self.lock().state = SessionState::Idle;
                if assembled.dropped_lines > 0 {
                    tracing::warn!(
                        turn = %turn_id,
                        dropped = assembled.dropped_lines,
                        "Reply contained malformed lines"
                    );
                }
                if assembled.end == StreamEnd::Cancelled {
                    SendOutcome::Cancelled(turn_id)
                } else {
                    tracing::debug!(turn = %turn_id, chars = assembled.text.len(), "Reply complete");
                    SendOutcome::Completed(turn_id)
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, kind = err.kind().as_str(), "Chat stream failed");
                self.fail(Some(turn_id), err.kind(), &mut on_render)
            }
        }
    }

    /// Take the input and append the user turn, or `None` if the send must be
    /// ignored.
    fn begin_send(&self) -> Option<RelayRequest> {
        let mut inner = self.lock();
        if inner.state.is_busy() {
            tracing::debug!("Send ignored: reply already in flight");
            return None;
        }
        let text = inner.input.trim().to_string();
        if text.is_empty() {
            return None;
        }

        inner.input.clear();
        inner.turns.push(ConversationTurn::new(Role::User, text));
        inner.state = SessionState::Sending;
        Some(RelayRequest::new(
            inner.turns.iter().map(ConversationTurn::to_message).collect(),
        ))
    }

    fn replace_content(&self, id: TurnId, text: &str) -> Option<ConversationTurn> {
        let mut inner = self.lock();
        let turn = inner.turns.iter_mut().find(|t| t.id == id)?;
        turn.content.clear();
        turn.content.push_str(text);
        Some(turn.clone())
    }

    fn fail(
        &self,
        partial: Option<TurnId>,
        kind: ErrorKind,
        on_render: &mut impl FnMut(&ConversationTurn),
    ) -> SendOutcome {
        let fallback = ConversationTurn::new(Role::Assistant, FALLBACK_MESSAGE);
        {
            let mut inner = self.lock();
            if let Some(id) = partial {
                inner.turns.retain(|t| t.id != id);
            }
            inner.turns.push(fallback.clone());
            inner.state = SessionState::Failed(kind);
        }
        on_render(&fallback);
        SendOutcome::Failed(kind)
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns the session to `Idle` if a send future is dropped mid-flight.
struct InFlight<'a> {
    session: &'a ChatSession,
    armed: bool,
}

impl InFlight<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.session.lock();
        if inner.state.is_busy() {
            tracing::debug!("Send abandoned mid-flight");
            inner.state = SessionState::Idle;
        }
    }
}
