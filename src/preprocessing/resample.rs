//! Audio resampling using rubato
//!
//! Sinc resampling for the in-process transcoder. Output is aligned to the
//! input (the resampler's delay is removed) and has `round(len * ratio)`
//! samples.

use rubato::{
    Resampler as RubatoResampler, SincFixedIn, SincInterpolationParameters,
    SincInterpolationType, WindowFunction,
};

use crate::error::PipelineError;
use crate::io::AudioBuffer;

/// Input chunk size fed to rubato
const CHUNK_SIZE: usize = 1024;

/// Resample a mono buffer to `target_rate`
///
/// Returns a clone when the rates already match.
///
/// # Errors
///
/// Returns `PipelineError::Resample` if either rate is zero or rubato fails
pub fn resample(audio: &AudioBuffer, target_rate: u32) -> Result<AudioBuffer, PipelineError> {
    if audio.sample_rate == 0 || target_rate == 0 {
        return Err(PipelineError::Resample(format!(
            "Cannot resample {} Hz -> {} Hz",
            audio.sample_rate, target_rate
        )));
    }
    if audio.sample_rate == target_rate {
        return Ok(audio.clone());
    }
    if audio.is_empty() {
        return Ok(AudioBuffer::new(Vec::new(), target_rate));
    }

    let ratio = target_rate as f64 / audio.sample_rate as f64;
    let expected = (audio.len() as f64 * ratio).round() as usize;

    let params = SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, CHUNK_SIZE, 1)
        .map_err(|e| PipelineError::Resample(format!("Failed to create resampler: {}", e)))?;

    let delay = resampler.output_delay();
    let wanted = delay + expected;
    let mut output: Vec<f32> = Vec::with_capacity(wanted + CHUNK_SIZE);
    let mut pos = 0;

    // Feed the signal, then zeros until the delayed tail has come out
    while output.len() < wanted {
        let mut chunk = vec![0.0f32; CHUNK_SIZE];
        if pos < audio.len() {
            let end = (pos + CHUNK_SIZE).min(audio.len());
            chunk[..end - pos].copy_from_slice(&audio.samples[pos..end]);
        }
        pos += CHUNK_SIZE;

        let result = resampler
            .process(&[chunk], None)
            .map_err(|e| PipelineError::Resample(format!("Resampling failed: {}", e)))?;
        if let Some(channel) = result.first() {
            output.extend_from_slice(channel);
        }
    }

    log::debug!(
        "Resampled {} Hz -> {} Hz: {} -> {} samples (delay {})",
        audio.sample_rate,
        target_rate,
        audio.len(),
        expected,
        delay
    );

    Ok(AudioBuffer::new(
        output[delay..wanted].to_vec(),
        target_rate,
    ))
}
