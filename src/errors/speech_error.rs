use std::time::Duration;

/// Error types for recognition attempts.
///
/// The variants map one-to-one onto the failure modes of a single attempt:
///
/// - `Conversion` and `Signing` abort the attempt with no partial result.
/// - `Transport` and `Timeout` degrade gracefully: if any transcript text was
///   assembled before the failure, the session returns it instead of the
///   error.
/// - `RemoteService` always aborts. A non-zero code means the service
///   rejected the request semantically (bad auth, bad audio format);
///   retrying the same request would fail identically.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SpeechError {
    #[error("audio conversion failed: {0}")]
    Conversion(String),
    #[error("request signing failed: {0}")]
    Signing(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("remote service error {code}: {message}")]
    RemoteService { code: i64, message: String },
    #[error("recognition attempt exceeded {0:?}")]
    Timeout(Duration),
}

impl SpeechError {
    /// Whether a session holding partial text may resolve with that text
    /// instead of surfacing this error.
    pub fn is_degradable(&self) -> bool {
        matches!(self, SpeechError::Transport(_) | SpeechError::Timeout(_))
    }
}

/// Result type alias for recognition operations.
pub type SpeechResult<T> = Result<T, SpeechError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = SpeechError::RemoteService {
            code: 10165,
            message: "invalid appid".to_string(),
        };
        assert_eq!(err.to_string(), "remote service error 10165: invalid appid");

        let err = SpeechError::Conversion("ffmpeg exited with status 1".to_string());
        assert!(err.to_string().contains("audio conversion failed"));
    }

    #[test]
    fn test_degradable_classification() {
        assert!(SpeechError::Transport("closed".into()).is_degradable());
        assert!(SpeechError::Timeout(Duration::from_secs(30)).is_degradable());
        assert!(!SpeechError::Conversion("bad".into()).is_degradable());
        assert!(!SpeechError::Signing("missing secret".into()).is_degradable());
        assert!(!SpeechError::RemoteService {
            code: 1,
            message: String::new()
        }
        .is_degradable());
    }
}
