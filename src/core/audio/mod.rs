//! Audio input types and normalization.
//!
//! The remote recognition service accepts exactly one format: PCM signed
//! 16-bit little-endian, mono, 16000 Hz, in a WAV container. Everything
//! arriving at the upload boundary (webm, mp3, ogg, ...) goes through
//! [`AudioNormalizer`] first.

pub mod normalizer;

pub use normalizer::AudioNormalizer;

/// An uploaded audio clip: an opaque byte buffer plus the declared
/// MIME/container hint.
///
/// The declared type is untrustworthy input; it only selects the temp-file
/// extension handed to the transcoder, never skips transcoding.
#[derive(Debug, Clone)]
pub struct AudioClip {
    bytes: Vec<u8>,
    mime_type: String,
}

impl AudioClip {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Zero-length clips short-circuit to an empty result without ever
    /// contacting the remote service.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Audio guaranteed to be 16-bit signed LE samples, mono, 16000 Hz, in a WAV
/// container.
///
/// Only [`AudioNormalizer`] produces values of this type; there is no public
/// constructor.
#[derive(Debug, Clone)]
pub struct PcmAudio {
    bytes: Vec<u8>,
}

impl PcmAudio {
    pub(crate) fn from_transcoded(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
