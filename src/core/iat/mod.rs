//! Client for the iFLYTEK IAT (internet audio transcription) streaming API.
//!
//! One recognition attempt is one signed WebSocket connection:
//!
//! 1. [`signer`] produces a time-boxed signed URL from the credential triple
//! 2. [`session`] drives the connection through its state machine, framing
//!    the PCM payload per the session protocol
//! 3. [`assembler`] folds inbound events into the final transcript
//!
//! Frame shapes live in [`messages`]; per-session knobs in [`config`].

pub mod assembler;
pub mod config;
pub mod messages;
pub mod session;
pub mod signer;

#[cfg(test)]
pub(crate) mod test_support;

pub use assembler::TranscriptAssembler;
pub use config::{IatConfig, IatLanguage, IAT_HOST, IAT_PATH};
pub use session::{
    SessionOutcome, SessionState, StreamingSession, Transport, TransportConnector, WsConnector,
};
pub use signer::{sign, Credentials, SessionHandshake};
