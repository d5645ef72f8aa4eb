use std::collections::HashMap;
use std::io::{self, Write};

use campchat_contracts::Role;

use crate::session::{ConversationTurn, TurnId};

const DISCARDED_MARKER: &str = " [discarded]";

/// Prints turns to a terminal as they grow.
///
/// Each render of a turn prints only the text not yet shown for that turn
/// id, so rendering the same content twice is a no-op. A turn replaced by
/// another before [`end_turn`](Self::end_turn) was aborted; it is marked
/// discarded on screen.
///
/// In buffered mode nothing is written until `end_turn`, and only the last
/// turn rendered since the previous `end_turn` is printed. Use it when the
/// output is not a terminal, so aborted partial text never reaches it.
pub struct TerminalRenderer<W: Write> {
    out: W,
    buffered: bool,
    printed: HashMap<TurnId, String>,
    current: Option<TurnId>,
    pending: Option<ConversationTurn>,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            buffered: false,
            printed: HashMap::new(),
            current: None,
            pending: None,
        }
    }

    pub fn buffered(out: W) -> Self {
        Self {
            buffered: true,
            ..Self::new(out)
        }
    }

    pub fn render(&mut self, turn: &ConversationTurn) -> io::Result<()> {
        if self.buffered {
            self.pending = Some(turn.clone());
            return Ok(());
        }

        let shown = self.printed.entry(turn.id).or_default();

        if self.current != Some(turn.id) {
            if self.current.is_some() {
                writeln!(self.out, "{}", DISCARDED_MARKER)?;
            }
            write!(self.out, "{}", label(turn.role))?;
            self.current = Some(turn.id);
            shown.clear();
        }

        match turn.content.strip_prefix(shown.as_str()) {
            Some(suffix) => write!(self.out, "{}", suffix)?,
            None => {
                // Content was replaced rather than extended.
                writeln!(self.out)?;
                write!(self.out, "{}{}", label(turn.role), turn.content)?;
            }
        }
        shown.clear();
        shown.push_str(&turn.content);
        self.out.flush()
    }

    /// Terminate the line of the turn being rendered.
    pub fn end_turn(&mut self) -> io::Result<()> {
        if let Some(turn) = self.pending.take() {
            writeln!(self.out, "{}{}", label(turn.role), turn.content)?;
        }
        if self.current.take().is_some() {
            writeln!(self.out)?;
        }
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn label(role: Role) -> &'static str {
    match role {
        Role::Assistant => "assistant> ",
        Role::User => "you> ",
        Role::System => "system> ",
    }
}
