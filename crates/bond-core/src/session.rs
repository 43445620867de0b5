//! Foreground interaction loop
//!
//! Reads a line, classifies it, records the turn, prints the reply and
//! persists the bond. Input comes from any [`LineSource`] so the loop can
//! be driven by a terminal editor or by a script.

use crate::emotion::{classify, EmotionLabel};
use crate::error::{BondError, Result};
use crate::responder::ResponseGenerator;
use crate::shutdown::Shutdown;
use crate::state::Bond;
use crate::store::BondStore;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Commands that end the session (case-insensitive)
pub const EXIT_COMMANDS: [&str; 3] = ["exit", "quit", "stop"];

/// Prompt shown before each line of input
pub const PROMPT: &str = "> ";

/// One read from the input source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    /// The user pressed Ctrl-C
    Interrupted,
    /// Input stream closed
    Eof,
}

/// Source of user input lines
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Result<Input>;
}

/// Why the loop returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user typed an exit command
    ExitCommand,
    EndOfInput,
    Interrupted,
    /// Running flag was cleared elsewhere
    Stopped,
    /// A turn failed and the session was aborted
    Failed(String),
}

/// Whole-line, case-insensitive match; surrounding whitespace makes it a turn
pub fn is_exit_command(line: &str) -> bool {
    EXIT_COMMANDS.iter().any(|cmd| line.eq_ignore_ascii_case(cmd))
}

pub struct InteractionLoop<R> {
    bond: Bond,
    store: Arc<BondStore>,
    shutdown: Shutdown,
    responder: R,
    user_name: String,
    abort_on_turn_failure: bool,
}

impl<R: ResponseGenerator> InteractionLoop<R> {
    pub fn new(
        bond: Bond,
        store: Arc<BondStore>,
        shutdown: Shutdown,
        responder: R,
        user_name: impl Into<String>,
    ) -> Self {
        Self {
            bond,
            store,
            shutdown,
            responder,
            user_name: user_name.into(),
            abort_on_turn_failure: true,
        }
    }

    /// Whether a failed turn ends the whole session (default) or is skipped
    pub fn with_abort_on_turn_failure(mut self, abort: bool) -> Self {
        self.abort_on_turn_failure = abort;
        self
    }

    /// Run until an exit command, end of input, interrupt or failure.
    ///
    /// The running flag is always cleared on return.
    pub fn run<S, W>(&self, input: &mut S, out: &mut W) -> SessionEnd
    where
        S: LineSource,
        W: Write,
    {
        let end = self.run_inner(input, out);
        self.shutdown.trigger();
        debug!(?end, "Interaction loop finished");
        end
    }

    fn run_inner<S: LineSource, W: Write>(&self, input: &mut S, out: &mut W) -> SessionEnd {
        let _ = writeln!(
            out,
            "Hello {}, Lucy is active. Type your messages below.",
            self.user_name
        );

        while self.shutdown.is_running() {
            let line = match input.read_line(PROMPT) {
                Ok(Input::Line(line)) => line,
                Ok(Input::Eof) => {
                    let _ = writeln!(out, "[Lucy] Shutting down...");
                    return SessionEnd::EndOfInput;
                }
                Ok(Input::Interrupted) | Err(BondError::Interrupted) => {
                    let _ = writeln!(out, "\n[Lucy] Interrupted. Shutting down...");
                    return SessionEnd::Interrupted;
                }
                Err(e) => {
                    if let Some(end) = self.turn_failed(e, out) {
                        return end;
                    }
                    continue;
                }
            };

            if is_exit_command(&line) {
                let _ = writeln!(out, "[Lucy] Shutting down...");
                return SessionEnd::ExitCommand;
            }

            if let Err(e) = self.turn(&line, out) {
                if let Some(end) = self.turn_failed(e, out) {
                    return end;
                }
            }
        }

        SessionEnd::Stopped
    }

    /// Handle one non-exit line. Returns the label it was classified as.
    ///
    /// The recorded turn is saved even when replying fails. A failed save
    /// is reported but does not fail the turn; the next successful save
    /// carries the current state.
    pub fn turn<W: Write>(&self, line: &str, out: &mut W) -> Result<EmotionLabel> {
        let label = classify(line);
        self.bond.record_turn(label, line);
        debug!(emotion = %label, profile = ?label.profile(), "Classified input");

        let replied = self.reply(label, line, out);

        if let Err(e) = self.store.save_with(|| self.bond.snapshot()) {
            warn!(error = %e, "Saving memory failed, will retry on next save");
        }

        replied.map(|()| label)
    }

    fn reply<W: Write>(&self, label: EmotionLabel, line: &str, out: &mut W) -> Result<()> {
        let reply = self.responder.respond(label, &self.user_name, line)?;
        writeln!(out, "Lucy [{}]: {}", label, reply)
            .and_then(|_| out.flush())
            .map_err(|e| BondError::Turn(format!("failed to write reply: {}", e)))
    }

    fn turn_failed<W: Write>(&self, e: BondError, out: &mut W) -> Option<SessionEnd> {
        error!(error = %e, "Turn failed");
        let _ = writeln!(out, "[Lucy][ERROR] {}", e);

        if self.abort_on_turn_failure {
            Some(SessionEnd::Failed(e.to_string()))
        } else {
            None
        }
    }
}
