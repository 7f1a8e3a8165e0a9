use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::iat::signer::Credentials;

/// Default end-of-speech silence threshold (milliseconds) sent in the
/// session init frame.
pub const DEFAULT_VAD_EOS_MS: u32 = 1600;

/// Default hard upper bound on one recognition attempt. The remote service
/// can otherwise leave a connection open indefinitely without sending a
/// terminal status.
pub const DEFAULT_ATTEMPT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the speech recognition client.
///
/// Credential fields are all optional: when any of them is missing the
/// recognizer runs in fallback mode and never opens a network connection.
#[derive(Debug, Clone, Default)]
pub struct SpeechConfig {
    /// iFLYTEK application id.
    pub app_id: Option<String>,
    /// iFLYTEK API key (key id used in the authorization header).
    pub api_key: Option<String>,
    /// iFLYTEK API secret (HMAC signing key).
    pub api_secret: Option<String>,
    /// Explicit path to the ffmpeg executable.
    pub ffmpeg_path: Option<PathBuf>,
    /// Fallback path used when no explicit override is set (the bundled
    /// binary location in packaged deployments).
    pub ffmpeg_fallback_path: Option<PathBuf>,
    /// End-of-speech silence threshold in milliseconds.
    pub vad_eos_ms: Option<u32>,
    /// Hard upper bound on the duration of one recognition attempt.
    pub attempt_timeout: Option<Duration>,
}

impl SpeechConfig {
    /// Load configuration from environment variables.
    ///
    /// Also loads from a .env file if present using dotenvy. Missing
    /// credential variables are not an error; they select fallback mode.
    pub fn from_env() -> Self {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let app_id = env::var("XF_APP_ID").ok().filter(|v| !v.is_empty());
        let api_key = env::var("XF_API_KEY").ok().filter(|v| !v.is_empty());
        let api_secret = env::var("XF_API_SECRET").ok().filter(|v| !v.is_empty());

        let ffmpeg_path = env::var("FFMPEG_PATH")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let ffmpeg_fallback_path = env::var("FFMPEG_FALLBACK_PATH")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let vad_eos_ms = env::var("XF_VAD_EOS_MS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok());
        let attempt_timeout = env::var("SPEECH_ATTEMPT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs);

        SpeechConfig {
            app_id,
            api_key,
            api_secret,
            ffmpeg_path,
            ffmpeg_fallback_path,
            vad_eos_ms,
            attempt_timeout,
        }
    }

    /// The credential triple, present only when all three fields are set.
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.app_id, &self.api_key, &self.api_secret) {
            (Some(app_id), Some(api_key), Some(api_secret)) => Some(Credentials {
                app_id: app_id.clone(),
                api_key: api_key.clone(),
                api_secret: api_secret.clone(),
            }),
            _ => None,
        }
    }

    /// Effective end-of-speech threshold.
    pub fn vad_eos_ms(&self) -> u32 {
        self.vad_eos_ms.unwrap_or(DEFAULT_VAD_EOS_MS)
    }

    /// Effective attempt deadline.
    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
            .unwrap_or(Duration::from_secs(DEFAULT_ATTEMPT_TIMEOUT_SECS))
    }
}
