//! In-process backend: Symphonia decode, rubato resample, hound encode

use std::path::Path;

use super::Transcoder;
use crate::error::PipelineError;
use crate::io::{decode_audio, save_wav, WavEncoding};
use crate::preprocessing::resample::resample;

/// Transcoder that needs no external program
#[derive(Debug, Clone)]
pub struct NativeTranscoder {
    sample_rate: u32,
    encoding: WavEncoding,
}

impl NativeTranscoder {
    /// Create a backend producing `sample_rate` Hz mono WAV
    pub fn new(sample_rate: u32, encoding: WavEncoding) -> Self {
        Self {
            sample_rate,
            encoding,
        }
    }
}

impl Transcoder for NativeTranscoder {
    fn name(&self) -> &'static str {
        "native"
    }

    fn transcode(&self, input: &Path, output: &Path) -> Result<(), PipelineError> {
        let decoded = decode_audio(input)?;
        let resampled = resample(&decoded, self.sample_rate)?;
        save_wav(output, &resampled, self.encoding)
    }
}
