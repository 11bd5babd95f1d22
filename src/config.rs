//! Configuration parameters for the preprocessing pipeline

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::io::WavEncoding;
use crate::preprocessing::normalization::NormalizationConfig;
use crate::preprocessing::silence::SilenceDetector;
use crate::transcode::TranscodeConfig;

/// Pipeline configuration parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    // Stage 1
    /// Transcoding backend, output rate and source extension
    /// (default: ffmpeg, 16000 Hz, "mp3")
    pub transcode: TranscodeConfig,

    // Stage 2
    /// Silence threshold and frame geometry (default: 30 dB, 2048/512)
    pub silence: SilenceDetector,

    // Stage 3
    /// Target RMS level and clipping policy (default: -20 dBFS, clamp)
    pub normalization: NormalizationConfig,

    // Output
    /// Sample encoding of every WAV the trim and normalize stages write
    /// (default: 16-bit PCM)
    pub encoding: WavEncoding,

    /// Hide progress bars (default: false)
    pub quiet: bool,
}

impl PipelineConfig {
    /// Validate every stage's parameters
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::InvalidInput` naming the first bad value
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.transcode.validate()?;
        self.silence.validate()?;
        self.normalization.validate()?;
        Ok(())
    }
}
