//! WAV reading and writing using hound
//!
//! Reads integer or float WAV at any channel count, downmixing to mono.
//! Writes mono WAV in the configured [`WavEncoding`], creating parent
//! directories first.

use std::fs;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use serde::{Deserialize, Serialize};

use super::AudioBuffer;
use crate::error::PipelineError;
use crate::preprocessing::channel_mixer::downmix_interleaved;

/// Sample encoding for written WAV files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WavEncoding {
    /// 16-bit signed PCM (default WAV subtype of float-array writers)
    #[default]
    Pcm16,
    /// 32-bit IEEE float
    Float32,
}

impl WavEncoding {
    /// hound spec for a mono file at `sample_rate`
    pub fn spec(self, sample_rate: u32) -> WavSpec {
        match self {
            WavEncoding::Pcm16 => WavSpec {
                channels: 1,
                sample_rate,
                bits_per_sample: 16,
                sample_format: SampleFormat::Int,
            },
            WavEncoding::Float32 => WavSpec {
                channels: 1,
                sample_rate,
                bits_per_sample: 32,
                sample_format: SampleFormat::Float,
            },
        }
    }
}

/// Full-scale magnitude of 16-bit PCM, shared by reads and writes
const PCM16_SCALE: f32 = 32768.0;

/// Convert a float sample to 16-bit PCM, saturating outside [-1, 1)
///
/// Uses the same 2^15 scale as [`load_wav`], so a loaded 16-bit file is
/// written back bit for bit.
#[inline]
fn f32_to_i16(sample: f32) -> i16 {
    // NaN survives the clamp and `as` maps it to 0
    (sample * PCM16_SCALE)
        .round()
        .clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Load a WAV file as a mono buffer at its native sample rate
pub fn load_wav<P: AsRef<Path>>(path: P) -> Result<AudioBuffer, PipelineError> {
    let path = path.as_ref();
    let reader = WavReader::open(path).map_err(|e| PipelineError::wav(path, e))?;

    let spec = reader.spec();
    let channels = spec.channels as usize;

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| PipelineError::wav(path, e))?,
        SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_value))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| PipelineError::wav(path, e))?
        }
    };

    log::debug!(
        "Loaded {}: {} frames, {} ch, {} Hz, {:?}",
        path.display(),
        samples.len() / channels.max(1),
        channels,
        spec.sample_rate,
        spec.sample_format
    );

    Ok(AudioBuffer::new(
        downmix_interleaved(&samples, channels),
        spec.sample_rate,
    ))
}

/// Write a mono buffer to `path`, creating parent directories as needed
pub fn save_wav<P: AsRef<Path>>(
    path: P,
    buffer: &AudioBuffer,
    encoding: WavEncoding,
) -> Result<(), PipelineError> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;

    let mut writer = WavWriter::create(path, encoding.spec(buffer.sample_rate))
        .map_err(|e| PipelineError::wav(path, e))?;

    match encoding {
        WavEncoding::Pcm16 => {
            for &sample in &buffer.samples {
                writer
                    .write_sample(f32_to_i16(sample))
                    .map_err(|e| PipelineError::wav(path, e))?;
            }
        }
        WavEncoding::Float32 => {
            for &sample in &buffer.samples {
                writer
                    .write_sample(sample)
                    .map_err(|e| PipelineError::wav(path, e))?;
            }
        }
    }

    writer.finalize().map_err(|e| PipelineError::wav(path, e))?;
    Ok(())
}

/// Create the parent directory of `path` if it does not exist yet
pub fn ensure_parent_dir(path: &Path) -> Result<(), PipelineError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))
        }
        _ => Ok(()),
    }
}
