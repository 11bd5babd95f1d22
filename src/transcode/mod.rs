//! Transcoding to mono WAV at a fixed sample rate
//!
//! Two backends implement [`Transcoder`]:
//! - [`FfmpegTranscoder`]: runs an external `ffmpeg` process (default)
//! - [`NativeTranscoder`]: decodes, downmixes and resamples in-process

mod ffmpeg;
mod native;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use ffmpeg::FfmpegTranscoder;
pub use native::NativeTranscoder;

use crate::error::PipelineError;
use crate::io::WavEncoding;

/// Sample rate produced by the transcoding stage unless configured otherwise
pub const DEFAULT_SAMPLE_RATE: u32 = 16000;

/// Which transcoding backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscoderKind {
    /// External ffmpeg process
    #[default]
    Ffmpeg,
    /// Symphonia decode + rubato resample + hound encode
    Native,
}

/// Transcoding configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscodeConfig {
    /// Output sample rate in Hz (default: 16000)
    pub sample_rate: u32,

    /// Backend (default: Ffmpeg)
    pub backend: TranscoderKind,

    /// Program invoked by the ffmpeg backend (default: "ffmpeg", looked up on PATH)
    pub ffmpeg_program: String,

    /// Extension of source files picked up by `convert` (default: "mp3")
    pub source_extension: String,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            backend: TranscoderKind::Ffmpeg,
            ffmpeg_program: "ffmpeg".to_string(),
            source_extension: "mp3".to_string(),
        }
    }
}

impl TranscodeConfig {
    /// Reject a zero sample rate or an empty source extension
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.sample_rate == 0 {
            return Err(PipelineError::InvalidInput(
                "Sample rate must be > 0".to_string(),
            ));
        }
        if self.source_extension.trim_start_matches('.').is_empty() {
            return Err(PipelineError::InvalidInput(
                "Source extension must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the configured backend
    pub fn build(&self, encoding: WavEncoding) -> Box<dyn Transcoder> {
        match self.backend {
            TranscoderKind::Ffmpeg => Box::new(FfmpegTranscoder::new(
                self.ffmpeg_program.clone(),
                self.sample_rate,
                encoding,
            )),
            TranscoderKind::Native => Box::new(NativeTranscoder::new(self.sample_rate, encoding)),
        }
    }
}

/// Produces a mono WAV at a fixed rate from an arbitrary audio file
pub trait Transcoder {
    /// Short backend name for logs and reports
    fn name(&self) -> &'static str;

    /// Transcode `input` into a WAV at `output`
    ///
    /// Creates the parent directory of `output` first. Overwrites an existing
    /// output file.
    fn transcode(&self, input: &Path, output: &Path) -> Result<(), PipelineError>;
}
