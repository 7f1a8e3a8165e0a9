//! Streaming recognition session: one signed connection, one attempt.
//!
//! The session owns a single logical recognition attempt. It opens the
//! transport, sends the init frame, streams audio frames at a controlled
//! pace, sends the end-of-stream marker, then consumes inbound events until
//! a terminal status, a failure, or the attempt deadline.
//!
//! The state machine is parameterized by its transport primitive through the
//! [`Transport`] / [`TransportConnector`] traits, so the same logic runs
//! against the real WebSocket stack and against scripted transports in
//! tests. No retry happens here: network failures surface to the caller,
//! which owns retry policy.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout, timeout_at, Instant};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use super::assembler::TranscriptAssembler;
use super::config::{IatConfig, AUDIO_CHUNK_BYTES, FRAME_INTERVAL};
use super::messages::OutboundFrame;
use super::signer::SessionHandshake;
use crate::errors::{SpeechError, SpeechResult};

/// How long to wait for a clean transport close before giving up.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// Transport seam
// =============================================================================

/// Minimal transport surface the session needs: ordered text frames in both
/// directions over one connection.
#[async_trait]
pub trait Transport: Send {
    /// Send one outbound text frame.
    async fn send_text(&mut self, frame: String) -> SpeechResult<()>;

    /// Receive the next inbound text frame. `None` means the remote closed
    /// the connection.
    async fn next_text(&mut self) -> Option<SpeechResult<String>>;

    /// Close the connection.
    async fn close(&mut self) -> SpeechResult<()>;
}

/// Opens a [`Transport`] for a signed URL. Injected into the recognizer so
/// tests can substitute a scripted transport.
#[async_trait]
pub trait TransportConnector: Send + Sync {
    async fn connect(&self, url: &str) -> SpeechResult<Box<dyn Transport>>;
}

/// The production transport: a tokio-tungstenite WebSocket stream.
pub struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Transport for WsTransport {
    async fn send_text(&mut self, frame: String) -> SpeechResult<()> {
        self.stream
            .send(Message::Text(frame.into()))
            .await
            .map_err(|e| SpeechError::Transport(format!("failed to send frame: {e}")))
    }

    async fn next_text(&mut self) -> Option<SpeechResult<String>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.to_string())),
                Ok(Message::Close(frame)) => {
                    info!("connection closed by remote: {:?}", frame);
                    return None;
                }
                Ok(Message::Binary(data)) => {
                    // The service only sends JSON text frames.
                    warn!(bytes = data.len(), "ignoring unexpected binary frame");
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    // Handled automatically by tokio-tungstenite.
                }
                Ok(Message::Frame(_)) => {}
                Err(e) => {
                    return Some(Err(SpeechError::Transport(format!("receive failed: {e}"))))
                }
            }
        }
    }

    async fn close(&mut self) -> SpeechResult<()> {
        self.stream
            .close(None)
            .await
            .map_err(|e| SpeechError::Transport(format!("close failed: {e}")))
    }
}

/// Default connector using `tokio_tungstenite::connect_async`.
#[derive(Debug, Default, Clone)]
pub struct WsConnector;

#[async_trait]
impl TransportConnector for WsConnector {
    async fn connect(&self, url: &str) -> SpeechResult<Box<dyn Transport>> {
        let (stream, _) = connect_async(url)
            .await
            .map_err(|e| SpeechError::Transport(format!("connection failed: {e}")))?;
        info!("connected to recognition service");
        Ok(Box::new(WsTransport { stream }))
    }
}

// =============================================================================
// Session state machine
// =============================================================================

/// Session lifecycle. `Error` is reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Handshaking,
    Streaming,
    AwaitingFinal,
    Closed,
    Error,
}

/// The resolved result of one attempt.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    /// Accumulated transcript text, fragments in arrival order.
    pub text: String,
    /// True when the session ended in `Error` but partial text was kept
    /// (graceful degradation on transport loss or timeout).
    pub degraded: bool,
    /// Final state, `Closed` or `Error`.
    pub state: SessionState,
}

/// One recognition attempt over one transport connection.
///
/// Single-use: `run` consumes the session. Dropping the returned future
/// mid-flight drops the transport with it, which closes the socket.
pub struct StreamingSession {
    config: IatConfig,
    state: SessionState,
    assembler: TranscriptAssembler,
}

impl StreamingSession {
    pub fn new(config: IatConfig) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            assembler: TranscriptAssembler::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drive the attempt to completion.
    ///
    /// Resolution rules:
    /// - terminal inbound status — `Closed`, accumulated text returned;
    /// - transport loss or deadline with accumulated text — `Error`, partial
    ///   text returned with `degraded` set;
    /// - transport loss or deadline with no text — the error surfaces;
    /// - non-zero inbound code — always surfaces, partial text discarded.
    pub async fn run(
        mut self,
        connector: &dyn TransportConnector,
        handshake: &SessionHandshake,
        app_id: &str,
        pcm: &[u8],
    ) -> SpeechResult<SessionOutcome> {
        let deadline = Instant::now() + self.config.attempt_timeout;

        if handshake.is_expired() {
            self.state = SessionState::Error;
            return Err(SpeechError::Signing("signed url has expired".to_string()));
        }

        self.state = SessionState::Connecting;
        debug!(state = ?self.state, "opening transport");
        let mut transport = match timeout_at(deadline, connector.connect(handshake.url())).await {
            Ok(Ok(transport)) => transport,
            Ok(Err(e)) => {
                self.state = SessionState::Error;
                return Err(e);
            }
            Err(_) => {
                self.state = SessionState::Error;
                return Err(SpeechError::Timeout(self.config.attempt_timeout));
            }
        };

        let result = self
            .drive(transport.as_mut(), app_id, pcm, deadline)
            .await;

        // Best-effort close on every path; the drop of the transport is the
        // backstop.
        match timeout(CLOSE_TIMEOUT, transport.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("transport close failed: {e}"),
            Err(_) => debug!("transport close timed out"),
        }

        match result {
            Ok(()) => {
                info!(chars = self.assembler.current_text().chars().count(), "session closed");
                Ok(SessionOutcome {
                    text: self.assembler.current_text(),
                    degraded: false,
                    state: self.state,
                })
            }
            Err(e) => {
                self.state = SessionState::Error;
                if e.is_degradable() && self.assembler.has_text() {
                    // Keep what the service already recognized instead of
                    // discarding partial work.
                    warn!(error = %e, "session degraded; returning partial transcript");
                    Ok(SessionOutcome {
                        text: self.assembler.current_text(),
                        degraded: true,
                        state: self.state,
                    })
                } else {
                    Err(e)
                }
            }
        }
    }

    async fn drive(
        &mut self,
        transport: &mut dyn Transport,
        app_id: &str,
        pcm: &[u8],
        deadline: Instant,
    ) -> SpeechResult<()> {
        // Init frame carries the session parameters and the first (possibly
        // only) audio chunk.
        self.state = SessionState::Handshaking;
        let mut chunks = pcm.chunks(AUDIO_CHUNK_BYTES);
        let first = chunks.next().unwrap_or(&[]);
        debug!(
            pcm_bytes = pcm.len(),
            first_chunk = first.len(),
            "sending init frame"
        );
        self.send_frame(
            transport,
            OutboundFrame::init(app_id, &self.config, first),
            deadline,
        )
        .await?;

        // Large payloads continue as status=1 frames at a fixed pace; short
        // clips skip this state entirely.
        let rest: Vec<&[u8]> = chunks.collect();
        if !rest.is_empty() {
            self.state = SessionState::Streaming;
            for chunk in rest {
                if Instant::now() >= deadline {
                    return Err(SpeechError::Timeout(self.config.attempt_timeout));
                }
                sleep(FRAME_INTERVAL).await;
                self.send_frame(transport, OutboundFrame::continuation(chunk), deadline)
                    .await?;
            }
        }

        // End-of-input marker; nothing more goes out.
        self.state = SessionState::AwaitingFinal;
        self.send_frame(transport, OutboundFrame::terminal(), deadline)
            .await?;

        // Inbound events are processed strictly in arrival order.
        loop {
            let raw = match timeout_at(deadline, transport.next_text()).await {
                Err(_) => return Err(SpeechError::Timeout(self.config.attempt_timeout)),
                Ok(None) => {
                    return Err(SpeechError::Transport(
                        "connection closed before terminal status".to_string(),
                    ))
                }
                Ok(Some(Err(e))) => return Err(e),
                Ok(Some(Ok(raw))) => raw,
            };

            self.assembler.ingest(&raw)?;
            if self.assembler.is_terminal() {
                self.state = SessionState::Closed;
                return Ok(());
            }
        }
    }

    async fn send_frame(
        &self,
        transport: &mut dyn Transport,
        frame: OutboundFrame,
        deadline: Instant,
    ) -> SpeechResult<()> {
        let json = frame
            .to_json()
            .map_err(|e| SpeechError::Transport(format!("failed to encode frame: {e}")))?;
        match timeout_at(deadline, transport.send_text(json)).await {
            Ok(result) => result,
            Err(_) => Err(SpeechError::Timeout(self.config.attempt_timeout)),
        }
    }
}
