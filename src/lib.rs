pub mod config;
pub mod core;
pub mod errors;

// Re-export commonly used items for convenience
pub use crate::core::*;
pub use config::SpeechConfig;
pub use errors::{SpeechError, SpeechResult};
