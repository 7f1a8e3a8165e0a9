//! Assembles inbound protocol events into a transcript.

use tracing::{debug, warn};

use super::messages::InboundMessage;
use crate::errors::{SpeechError, SpeechResult};

/// Consumes one inbound message at a time and accumulates text fragments in
/// arrival order.
///
/// The service sends recognized words progressively, newest fragment last.
/// Fragments are concatenated, never re-ordered and never deduplicated: with
/// progressive results (`dwa: "wpgs"`) the service may resend an overlapping
/// fragment and this assembler has no way to detect it. Accepted limitation.
///
/// The first non-zero `code` raises [`SpeechError::RemoteService`] and stops
/// processing; later ingests become no-ops.
#[derive(Debug, Default)]
pub struct TranscriptAssembler {
    fragments: Vec<String>,
    terminal: bool,
    failed: bool,
}

impl TranscriptAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one raw inbound message.
    pub fn ingest(&mut self, raw: &str) -> SpeechResult<()> {
        if self.failed {
            // Processing ceased at the first remote error.
            return Ok(());
        }

        let msg = InboundMessage::parse(raw)
            .map_err(|e| SpeechError::Transport(format!("malformed inbound message: {e}")))?;

        if msg.code != 0 {
            self.failed = true;
            let message = msg.message.unwrap_or_default();
            warn!(code = msg.code, reason = %message, "remote service rejected the session");
            return Err(SpeechError::RemoteService {
                code: msg.code,
                message,
            });
        }

        let before = self.fragments.len();
        self.fragments
            .extend(msg.fragments().map(str::to_string));
        if self.fragments.len() > before {
            debug!(
                new_fragments = self.fragments.len() - before,
                sid = msg.sid.as_deref().unwrap_or(""),
                "appended transcript fragments"
            );
        }

        if msg.is_terminal() {
            self.terminal = true;
        }
        Ok(())
    }

    /// Whether the terminal inbound status has been seen.
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// The accumulated text so far, fragments concatenated in arrival order.
    pub fn current_text(&self) -> String {
        self.fragments.concat()
    }

    /// Whether any text has been accumulated.
    pub fn has_text(&self) -> bool {
        self.fragments.iter().any(|f| !f.is_empty())
    }
}
