//! Wire message types for the iFLYTEK IAT WebSocket API.
//!
//! Everything on this connection is JSON text frames, in both directions.
//!
//! - **Outbound**: [`OutboundFrame`] in three shapes, distinguished by
//!   `data.status`:
//!   - `0` — init frame: carries `common.app_id`, the `business` block and
//!     the first (possibly only) base64 audio chunk
//!   - `1` — continuation frame: further base64 audio chunks
//!   - `2` — terminal frame: no audio, signals end-of-input
//! - **Inbound**: [`InboundMessage`]: `code` (0 = success), `message`,
//!   `data.status` (2 = terminal) and the recognized word fragments at
//!   `data.result.ws[].cw[].w`.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::config::IatConfig;

/// Audio format string for 16 kHz s16le PCM, the only format sent.
pub const AUDIO_FORMAT: &str = "audio/L16;rate=16000";

/// Audio encoding string for raw (uncontainered) PCM frames.
pub const AUDIO_ENCODING: &str = "raw";

// =============================================================================
// Outbound frames (client to server)
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct CommonBlock {
    pub app_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BusinessBlock {
    pub language: String,
    pub domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    pub vad_eos: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dwa: Option<String>,
}

impl BusinessBlock {
    pub fn from_config(config: &IatConfig) -> Self {
        Self {
            language: config.language.as_wire().to_string(),
            domain: config.domain.clone(),
            accent: config.language.accent().map(str::to_string),
            vad_eos: config.vad_eos_ms,
            dwa: config.dwa.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DataBlock {
    pub status: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
}

/// One outbound JSON frame.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundFrame {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common: Option<CommonBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business: Option<BusinessBlock>,
    pub data: DataBlock,
}

impl OutboundFrame {
    /// The init frame: session parameters plus the first audio chunk.
    pub fn init(app_id: &str, config: &IatConfig, first_chunk: &[u8]) -> Self {
        Self {
            common: Some(CommonBlock {
                app_id: app_id.to_string(),
            }),
            business: Some(BusinessBlock::from_config(config)),
            data: DataBlock {
                status: 0,
                format: Some(AUDIO_FORMAT.to_string()),
                encoding: Some(AUDIO_ENCODING.to_string()),
                audio: Some(BASE64.encode(first_chunk)),
            },
        }
    }

    /// A continuation frame for payloads split across messages.
    pub fn continuation(chunk: &[u8]) -> Self {
        Self {
            common: None,
            business: None,
            data: DataBlock {
                status: 1,
                format: Some(AUDIO_FORMAT.to_string()),
                encoding: Some(AUDIO_ENCODING.to_string()),
                audio: Some(BASE64.encode(chunk)),
            },
        }
    }

    /// The terminal frame: no audio, end-of-input marker.
    pub fn terminal() -> Self {
        Self {
            common: None,
            business: None,
            data: DataBlock {
                status: 2,
                format: None,
                encoding: None,
                audio: None,
            },
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// =============================================================================
// Inbound messages (server to client)
// =============================================================================

/// One recognized word candidate.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Candidate {
    #[serde(default)]
    pub w: String,
}

/// One word group; the service sends the best candidate first.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct WordGroup {
    #[serde(default)]
    pub cw: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct InboundResult {
    #[serde(default)]
    pub ws: Vec<WordGroup>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct InboundData {
    #[serde(default)]
    pub status: Option<u8>,
    #[serde(default)]
    pub result: Option<InboundResult>,
}

/// One inbound JSON message.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub sid: Option<String>,
    #[serde(default)]
    pub data: Option<InboundData>,
}

impl InboundMessage {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Whether this message carries the terminal status.
    pub fn is_terminal(&self) -> bool {
        self.data
            .as_ref()
            .and_then(|d| d.status)
            .is_some_and(|s| s == 2)
    }

    /// Word fragments in the order the service sent them.
    pub fn fragments(&self) -> impl Iterator<Item = &str> {
        self.data
            .iter()
            .filter_map(|d| d.result.as_ref())
            .flat_map(|r| r.ws.iter())
            .flat_map(|group| group.cw.iter())
            .filter(|cw| !cw.w.is_empty())
            .map(|cw| cw.w.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::iat::config::IatLanguage;
    use serde_json::Value;

    #[test]
    fn test_init_frame_shape() {
        let config = IatConfig::default();
        let frame = OutboundFrame::init("49ee8b93", &config, b"\x01\x02\x03");
        let json: Value = serde_json::from_str(&frame.to_json().unwrap()).unwrap();

        assert_eq!(json["common"]["app_id"], "49ee8b93");
        assert_eq!(json["business"]["language"], "zh_cn");
        assert_eq!(json["business"]["domain"], "iat");
        assert_eq!(json["business"]["accent"], "mandarin");
        assert_eq!(json["business"]["vad_eos"], 1600);
        assert_eq!(json["business"]["dwa"], "wpgs");
        assert_eq!(json["data"]["status"], 0);
        assert_eq!(json["data"]["format"], "audio/L16;rate=16000");
        assert_eq!(json["data"]["encoding"], "raw");
        assert_eq!(json["data"]["audio"], BASE64.encode(b"\x01\x02\x03"));
    }

    #[test]
    fn test_init_frame_english_has_no_accent() {
        let config = IatConfig {
            language: IatLanguage::EnUs,
            ..Default::default()
        };
        let frame = OutboundFrame::init("app", &config, b"x");
        let json: Value = serde_json::from_str(&frame.to_json().unwrap()).unwrap();
        assert_eq!(json["business"]["language"], "en_us");
        assert!(json["business"].get("accent").is_none());
    }

    #[test]
    fn test_terminal_frame_has_no_audio() {
        let frame = OutboundFrame::terminal();
        let json: Value = serde_json::from_str(&frame.to_json().unwrap()).unwrap();
        assert_eq!(json["data"]["status"], 2);
        assert!(json["data"].get("audio").is_none());
        assert!(json.get("common").is_none());
        assert!(json.get("business").is_none());
    }

    #[test]
    fn test_parse_inbound_fragments_in_order() {
        let raw = r#"{
            "code": 0,
            "message": "success",
            "sid": "iat000001",
            "data": {
                "status": 1,
                "result": {
                    "ws": [
                        {"cw": [{"w": "你好"}]},
                        {"cw": [{"w": "，"}, {"w": ""}]},
                        {"cw": [{"w": "世界"}]}
                    ]
                }
            }
        }"#;
        let msg = InboundMessage::parse(raw).unwrap();
        assert_eq!(msg.code, 0);
        assert!(!msg.is_terminal());
        let fragments: Vec<&str> = msg.fragments().collect();
        assert_eq!(fragments, vec!["你好", "，", "世界"]);
    }

    #[test]
    fn test_parse_terminal_without_result() {
        let raw = r#"{"code": 0, "data": {"status": 2, "result": {"ws": []}}}"#;
        let msg = InboundMessage::parse(raw).unwrap();
        assert!(msg.is_terminal());
        assert_eq!(msg.fragments().count(), 0);
    }

    #[test]
    fn test_parse_error_message() {
        let raw = r#"{"code": 10165, "message": "invalid appid"}"#;
        let msg = InboundMessage::parse(raw).unwrap();
        assert_eq!(msg.code, 10165);
        assert_eq!(msg.message.as_deref(), Some("invalid appid"));
        assert!(!msg.is_terminal());
    }
}
