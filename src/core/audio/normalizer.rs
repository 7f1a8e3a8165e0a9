//! Audio normalization via an external ffmpeg process.
//!
//! Each invocation writes the input to its own scoped temp file, runs ffmpeg
//! requesting `pcm_s16le` / 16000 Hz / mono / WAV, and reads the result back
//! into memory. Temp files are owned by [`tempfile::NamedTempFile`] handles,
//! so they are removed on every exit path: success, transcoder failure, and
//! cancellation of the calling task.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tempfile::Builder;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{AudioClip, PcmAudio};
use crate::config::SpeechConfig;
use crate::errors::{SpeechError, SpeechResult};

/// Map a declared MIME type to the temp-file extension handed to ffmpeg.
///
/// Unknown types map to a generic binary extension and let ffmpeg probe the
/// container itself.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "audio/webm" | "audio/webm;codecs=opus" => "webm",
        "audio/mp3" | "audio/mpeg" => "mp3",
        "audio/ogg" => "ogg",
        "audio/wav" | "audio/wave" | "audio/x-wav" => "wav",
        _ => "bin",
    }
}

/// Converts arbitrary input audio into the single format the remote service
/// accepts.
///
/// A WAV-declared clip is still re-transcoded: the declared sample rate and
/// channel count are not trusted.
#[derive(Debug, Clone)]
pub struct AudioNormalizer {
    ffmpeg: PathBuf,
    work_dir: PathBuf,
}

impl AudioNormalizer {
    /// Build a normalizer from the configuration.
    ///
    /// Executable resolution order: explicit override, bundled-binary
    /// fallback, `ffmpeg` on PATH.
    pub fn new(config: &SpeechConfig) -> Self {
        let ffmpeg = config
            .ffmpeg_path
            .clone()
            .or_else(|| config.ffmpeg_fallback_path.clone())
            .unwrap_or_else(|| PathBuf::from("ffmpeg"));
        Self {
            ffmpeg,
            work_dir: std::env::temp_dir(),
        }
    }

    /// Override the directory temp files are created in.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    /// Transcode `clip` to PCM s16le / 16000 Hz / mono in a WAV container.
    ///
    /// May block for the duration of the external process; concurrent
    /// normalizations use independent temp file pairs and never collide.
    pub async fn normalize(&self, clip: &AudioClip) -> SpeechResult<PcmAudio> {
        let extension = extension_for_mime(clip.mime_type());
        debug!(
            mime_type = clip.mime_type(),
            extension,
            input_bytes = clip.bytes().len(),
            "normalizing audio clip"
        );

        // Both handles stay in scope for the whole transcode; dropping them
        // (on any return or on cancellation) removes the files.
        let mut input = Builder::new()
            .prefix("input_")
            .suffix(&format!(".{extension}"))
            .tempfile_in(&self.work_dir)
            .map_err(|e| SpeechError::Conversion(format!("failed to create temp file: {e}")))?;
        let output = Builder::new()
            .prefix("output_")
            .suffix(".wav")
            .tempfile_in(&self.work_dir)
            .map_err(|e| SpeechError::Conversion(format!("failed to create temp file: {e}")))?;

        input
            .write_all(clip.bytes())
            .and_then(|_| input.flush())
            .map_err(|e| SpeechError::Conversion(format!("failed to write input file: {e}")))?;

        self.run_transcode(input.path(), output.path()).await?;

        let wav = tokio::fs::read(output.path())
            .await
            .map_err(|e| SpeechError::Conversion(format!("failed to read output file: {e}")))?;
        if wav.is_empty() {
            return Err(SpeechError::Conversion(
                "transcoder produced no output".to_string(),
            ));
        }

        debug!(output_bytes = wav.len(), "audio clip normalized");
        Ok(PcmAudio::from_transcoded(wav))
    }

    async fn run_transcode(&self, input: &Path, output: &Path) -> SpeechResult<()> {
        let result = Command::new(&self.ffmpeg)
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-y")
            .arg("-i")
            .arg(input)
            .arg("-acodec")
            .arg("pcm_s16le")
            .arg("-ar")
            .arg("16000")
            .arg("-ac")
            .arg("1")
            .arg("-f")
            .arg("wav")
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            // The child must not outlive a cancelled normalization.
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                SpeechError::Conversion(format!(
                    "failed to run {}: {e}",
                    self.ffmpeg.to_string_lossy()
                ))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            warn!(status = %result.status, "transcoder failed: {}", stderr.trim());
            return Err(SpeechError::Conversion(format!(
                "transcoder exited with {}: {}",
                result.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}
