//! Public entry point for speech recognition.
//!
//! `SpeechRecognizer` combines normalization, request signing and the
//! streaming session behind one call. Without a complete credential triple
//! it runs in fallback mode: a fixed per-language mock transcript, no
//! network activity, so the rest of the system can be exercised without
//! live credentials.

use std::sync::Arc;

use tracing::{debug, info};

use super::audio::{AudioClip, AudioNormalizer, PcmAudio};
use super::iat::{
    sign, signer::http_date_now, IatConfig, IatLanguage, SessionOutcome, StreamingSession,
    TransportConnector, WsConnector, IAT_HOST, IAT_PATH,
};
use crate::config::SpeechConfig;
use crate::errors::SpeechResult;

/// Confidence for non-empty text from a genuine remote session. A coarse
/// signal, not a calibrated probability.
pub const CONFIDENCE_TRANSCRIBED: f32 = 0.85;

/// Confidence tag for fallback-mode mock output, distinct from both the
/// transcribed and the empty value.
pub const CONFIDENCE_MOCK: f32 = 0.9;

/// Confidence for empty transcripts.
pub const CONFIDENCE_EMPTY: f32 = 0.0;

/// Final recognition output handed back across the result boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionResult {
    pub text: String,
    /// 0.0–1.0; see the confidence constants.
    pub confidence: f32,
}

impl RecognitionResult {
    fn empty() -> Self {
        Self {
            text: String::new(),
            confidence: CONFIDENCE_EMPTY,
        }
    }

    fn transcribed(text: String) -> Self {
        let confidence = if text.is_empty() {
            CONFIDENCE_EMPTY
        } else {
            CONFIDENCE_TRANSCRIBED
        };
        Self { text, confidence }
    }

    fn mock(language: IatLanguage) -> Self {
        let text = match language {
            IatLanguage::ZhCn => "测试音频识别结果",
            IatLanguage::EnUs => "Sample speech recognition result",
        };
        Self {
            text: text.to_string(),
            confidence: CONFIDENCE_MOCK,
        }
    }
}

/// Speech recognition facade.
///
/// The transport connector is constructor-injected and scoped to this
/// instance; there is no process-wide client state. `Credentials` inside the
/// config are read-only and shared across concurrent attempts; every attempt
/// owns its own connection, handshake and temp files.
pub struct SpeechRecognizer {
    config: SpeechConfig,
    normalizer: AudioNormalizer,
    connector: Arc<dyn TransportConnector>,
}

impl SpeechRecognizer {
    /// Recognizer backed by the real WebSocket transport.
    pub fn new(config: SpeechConfig) -> Self {
        Self::with_connector(config, Arc::new(WsConnector))
    }

    /// Recognizer with an injected transport connector.
    pub fn with_connector(config: SpeechConfig, connector: Arc<dyn TransportConnector>) -> Self {
        let normalizer = AudioNormalizer::new(&config);
        Self {
            config,
            normalizer,
            connector,
        }
    }

    /// Recognize an arbitrary uploaded clip.
    ///
    /// Normalizes the clip to the service's PCM format first; empty clips
    /// and missing credentials short-circuit before any transcoding or
    /// network activity.
    pub async fn recognize(
        &self,
        clip: &AudioClip,
        language: &str,
    ) -> SpeechResult<RecognitionResult> {
        if clip.is_empty() {
            debug!("empty clip; returning empty result");
            return Ok(RecognitionResult::empty());
        }
        let lang = IatLanguage::from_tag(language);
        if self.config.credentials().is_none() {
            info!("credentials missing; returning fallback transcript");
            return Ok(RecognitionResult::mock(lang));
        }

        let pcm = self.normalizer.normalize(clip).await?;
        self.recognize_pcm(&pcm, language).await
    }

    /// Recognize audio already normalized by this crate's normalizer.
    pub async fn recognize_pcm(
        &self,
        pcm: &PcmAudio,
        language: &str,
    ) -> SpeechResult<RecognitionResult> {
        if pcm.is_empty() {
            return Ok(RecognitionResult::empty());
        }
        let lang = IatLanguage::from_tag(language);
        let Some(credentials) = self.config.credentials() else {
            info!("credentials missing; returning fallback transcript");
            return Ok(RecognitionResult::mock(lang));
        };

        // The signature is time-boxed; sign immediately before connecting.
        let handshake = sign(&credentials, IAT_HOST, IAT_PATH, &http_date_now())?;

        let session_config = IatConfig {
            language: lang,
            vad_eos_ms: self.config.vad_eos_ms(),
            attempt_timeout: self.config.attempt_timeout(),
            ..Default::default()
        };
        let session = StreamingSession::new(session_config);
        let SessionOutcome { text, degraded, .. } = session
            .run(
                self.connector.as_ref(),
                &handshake,
                &credentials.app_id,
                pcm.as_bytes(),
            )
            .await?;

        info!(
            chars = text.chars().count(),
            degraded, "recognition attempt resolved"
        );
        Ok(RecognitionResult::transcribed(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::iat::test_support::{error_msg, result_msg, MockConnector, ScriptedEvent};
    use crate::errors::SpeechError;

    fn config_with_credentials() -> SpeechConfig {
        SpeechConfig {
            app_id: Some("test-app".to_string()),
            api_key: Some("test-key".to_string()),
            api_secret: Some("test-secret".to_string()),
            ..Default::default()
        }
    }

    fn recognizer(
        config: SpeechConfig,
        script: Vec<ScriptedEvent>,
    ) -> (SpeechRecognizer, Arc<MockConnector>) {
        let connector = Arc::new(MockConnector::new(script));
        (
            SpeechRecognizer::with_connector(config, connector.clone()),
            connector,
        )
    }

    fn pcm(bytes: &[u8]) -> PcmAudio {
        PcmAudio::from_transcoded(bytes.to_vec())
    }

    #[tokio::test]
    async fn test_empty_clip_short_circuits() {
        let (recognizer, connector) = recognizer(config_with_credentials(), vec![]);
        let clip = AudioClip::new(Vec::new(), "audio/webm");

        let result = recognizer.recognize(&clip, "zh-CN").await.unwrap();
        assert_eq!(result.text, "");
        assert_eq!(result.confidence, CONFIDENCE_EMPTY);
        assert_eq!(connector.connect_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_credentials_returns_mock_without_network() {
        let (recognizer, connector) = recognizer(SpeechConfig::default(), vec![]);
        let clip = AudioClip::new(vec![1, 2, 3], "audio/webm");

        let zh = recognizer.recognize(&clip, "zh-CN").await.unwrap();
        assert_eq!(zh.text, "测试音频识别结果");
        assert_eq!(zh.confidence, CONFIDENCE_MOCK);

        let en = recognizer.recognize(&clip, "en-US").await.unwrap();
        assert_eq!(en.text, "Sample speech recognition result");
        assert_eq!(en.confidence, CONFIDENCE_MOCK);

        assert_eq!(connector.connect_count(), 0);
    }

    #[tokio::test]
    async fn test_silence_yields_empty_zero_confidence() {
        // Remote answers with a terminal status and no word groups.
        let (recognizer, connector) = recognizer(
            config_with_credentials(),
            vec![ScriptedEvent::Text(result_msg(2, &[]))],
        );

        // Two seconds of silence at 16 kHz s16le mono.
        let silence = pcm(&vec![0u8; 2 * 16000 * 2]);
        let result = recognizer.recognize_pcm(&silence, "zh-CN").await.unwrap();

        assert_eq!(result.text, "");
        assert_eq!(result.confidence, CONFIDENCE_EMPTY);
        assert_eq!(connector.connect_count(), 1);
    }

    #[tokio::test]
    async fn test_progressive_fragments_yield_transcript() {
        let (recognizer, _connector) = recognizer(
            config_with_credentials(),
            vec![
                ScriptedEvent::Text(result_msg(1, &["你好"])),
                ScriptedEvent::Text(result_msg(2, &["世界"])),
            ],
        );

        let result = recognizer
            .recognize_pcm(&pcm(&[0u8; 320]), "zh-CN")
            .await
            .unwrap();
        assert_eq!(result.text, "你好世界");
        assert_eq!(result.confidence, CONFIDENCE_TRANSCRIBED);
    }

    #[tokio::test]
    async fn test_remote_rejection_aborts_without_retry() {
        let (recognizer, connector) = recognizer(
            config_with_credentials(),
            vec![ScriptedEvent::Text(error_msg(10165, "invalid appid"))],
        );

        let err = recognizer
            .recognize_pcm(&pcm(&[0u8; 320]), "zh-CN")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SpeechError::RemoteService { code: 10165, .. }
        ));
        // Exactly one attempt; the facade does not retry.
        assert_eq!(connector.connect_count(), 1);
    }

    #[tokio::test]
    async fn test_early_close_returns_partial_transcript() {
        let (recognizer, _connector) = recognizer(
            config_with_credentials(),
            vec![ScriptedEvent::Text(result_msg(1, &["你好"]))],
        );

        let result = recognizer
            .recognize_pcm(&pcm(&[0u8; 320]), "zh-CN")
            .await
            .unwrap();
        assert_eq!(result.text, "你好");
        assert_eq!(result.confidence, CONFIDENCE_TRANSCRIBED);
    }

    #[tokio::test]
    async fn test_empty_pcm_short_circuits() {
        let (recognizer, connector) = recognizer(config_with_credentials(), vec![]);
        let result = recognizer.recognize_pcm(&pcm(&[]), "zh-CN").await.unwrap();
        assert_eq!(result, RecognitionResult::empty());
        assert_eq!(connector.connect_count(), 0);
    }

    #[test]
    fn test_confidence_constants_are_distinct() {
        assert_ne!(CONFIDENCE_TRANSCRIBED, CONFIDENCE_MOCK);
        assert_ne!(CONFIDENCE_MOCK, CONFIDENCE_EMPTY);
        assert_ne!(CONFIDENCE_TRANSCRIBED, CONFIDENCE_EMPTY);
    }
}
