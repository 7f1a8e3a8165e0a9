pub mod audio;
pub mod iat;
pub mod recognizer;

pub use audio::{AudioClip, AudioNormalizer, PcmAudio};
pub use recognizer::{
    RecognitionResult, SpeechRecognizer, CONFIDENCE_EMPTY, CONFIDENCE_MOCK, CONFIDENCE_TRANSCRIBED,
};
