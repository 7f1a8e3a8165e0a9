//! Session configuration for the iFLYTEK IAT streaming API.

use std::time::Duration;

/// Hostname of the IAT WebSocket endpoint.
pub const IAT_HOST: &str = "iat-api.xfyun.cn";

/// Request path of the IAT WebSocket endpoint.
pub const IAT_PATH: &str = "/v2/iat";

/// Bytes of PCM per outbound audio frame. 1280 bytes is 40 ms of 16 kHz
/// s16le mono; 32 of them keep the frame count low for short clips while
/// staying well under the service's message size limit.
pub const AUDIO_CHUNK_BYTES: usize = 32 * 1280;

/// Pacing interval between continuation frames.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(40);

/// Recognition language, mapped from a BCP-47-ish tag at the facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IatLanguage {
    #[default]
    ZhCn,
    EnUs,
}

impl IatLanguage {
    /// Map a requested language tag onto the two languages the service
    /// supports. Anything that does not start with `en` is treated as
    /// Chinese, matching the facade's `zh-CN` default.
    pub fn from_tag(tag: &str) -> Self {
        if tag.to_ascii_lowercase().starts_with("en") {
            IatLanguage::EnUs
        } else {
            IatLanguage::ZhCn
        }
    }

    /// The wire value for `business.language`.
    pub fn as_wire(&self) -> &'static str {
        match self {
            IatLanguage::ZhCn => "zh_cn",
            IatLanguage::EnUs => "en_us",
        }
    }

    /// The `business.accent` value; mandarin-only when Chinese.
    pub fn accent(&self) -> Option<&'static str> {
        match self {
            IatLanguage::ZhCn => Some("mandarin"),
            IatLanguage::EnUs => None,
        }
    }
}

/// Per-session recognition parameters carried in the init frame.
#[derive(Debug, Clone)]
pub struct IatConfig {
    /// Target language.
    pub language: IatLanguage,
    /// Recognition domain. The service's general dictation domain is "iat".
    pub domain: String,
    /// End-of-speech silence threshold in milliseconds.
    pub vad_eos_ms: u32,
    /// Progressive-result flag. The service may resend overlapping fragments
    /// when this is set; the assembler appends without deduplication.
    pub dwa: Option<String>,
    /// Hard deadline for the whole attempt.
    pub attempt_timeout: Duration,
}

impl Default for IatConfig {
    fn default() -> Self {
        Self {
            language: IatLanguage::default(),
            domain: "iat".to_string(),
            vad_eos_ms: crate::config::DEFAULT_VAD_EOS_MS,
            dwa: Some("wpgs".to_string()),
            attempt_timeout: Duration::from_secs(crate::config::DEFAULT_ATTEMPT_TIMEOUT_SECS),
        }
    }
}
