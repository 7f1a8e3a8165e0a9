//! Scripted transport stubs shared by session and recognizer tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::session::{Transport, TransportConnector};
use crate::errors::{SpeechError, SpeechResult};

/// One scripted inbound event.
#[derive(Debug, Clone)]
pub(crate) enum ScriptedEvent {
    /// Deliver a text frame.
    Text(String),
    /// Fail the receive with a transport error.
    Fail(String),
    /// Never resolve; used with paused time to trigger the deadline.
    Hang,
}

/// A transport that replays a fixed inbound script and records every
/// outbound frame. When the script runs out, the connection reads as closed.
pub(crate) struct MockTransport {
    script: VecDeque<ScriptedEvent>,
    sent: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_text(&mut self, frame: String) -> SpeechResult<()> {
        self.sent.lock().unwrap().push(frame);
        Ok(())
    }

    async fn next_text(&mut self) -> Option<SpeechResult<String>> {
        match self.script.pop_front() {
            Some(ScriptedEvent::Text(text)) => Some(Ok(text)),
            Some(ScriptedEvent::Fail(reason)) => Some(Err(SpeechError::Transport(reason))),
            Some(ScriptedEvent::Hang) => {
                futures::future::pending::<()>().await;
                unreachable!()
            }
            None => None,
        }
    }

    async fn close(&mut self) -> SpeechResult<()> {
        Ok(())
    }
}

/// Connector handing out one scripted transport per connect call.
///
/// Counts connection attempts so fallback-mode tests can assert no network
/// activity happened.
pub(crate) struct MockConnector {
    script: Mutex<Vec<ScriptedEvent>>,
    sent: Arc<Mutex<Vec<String>>>,
    connects: AtomicUsize,
    refuse: bool,
}

impl MockConnector {
    pub(crate) fn new(script: Vec<ScriptedEvent>) -> Self {
        Self {
            script: Mutex::new(script),
            sent: Arc::new(Mutex::new(Vec::new())),
            connects: AtomicUsize::new(0),
            refuse: false,
        }
    }

    /// A connector whose connect attempts fail outright.
    pub(crate) fn refusing() -> Self {
        let mut connector = Self::new(Vec::new());
        connector.refuse = true;
        connector
    }

    pub(crate) fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Outbound frames recorded across all handed-out transports.
    pub(crate) fn sent_frames(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransportConnector for MockConnector {
    async fn connect(&self, _url: &str) -> SpeechResult<Box<dyn Transport>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.refuse {
            return Err(SpeechError::Transport("connection refused".to_string()));
        }
        let script = std::mem::take(&mut *self.script.lock().unwrap());
        Ok(Box::new(MockTransport {
            script: script.into(),
            sent: self.sent.clone(),
        }))
    }
}

/// Inbound message with `code=0` and the given fragments.
pub(crate) fn result_msg(status: u8, words: &[&str]) -> String {
    let ws: Vec<String> = words
        .iter()
        .map(|w| format!(r#"{{"cw": [{{"w": "{w}"}}]}}"#))
        .collect();
    format!(
        r#"{{"code": 0, "data": {{"status": {status}, "result": {{"ws": [{}]}}}}}}"#,
        ws.join(",")
    )
}

/// Inbound message with a non-zero error code.
pub(crate) fn error_msg(code: i64, message: &str) -> String {
    format!(r#"{{"code": {code}, "message": "{message}"}}"#)
}
