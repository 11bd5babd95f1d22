//! Audio normalization utilities
//!
//! RMS normalization: one global gain brings the buffer's root-mean-square
//! level to a target in dBFS (full scale = amplitude 1.0).
//!
//! # Example
//!
//! ```no_run
//! use wavprep::preprocessing::normalization::{normalize, NormalizationConfig};
//!
//! let mut samples = vec![0.05f32; 16000];
//! let report = normalize(&mut samples, &NormalizationConfig::default())?;
//! println!("Applied gain: {:.2} dB", report.gain_db);
//! # Ok::<(), wavprep::PipelineError>(())
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::io::{load_wav, save_wav, WavEncoding};

/// What to do with samples pushed outside [-1.0, 1.0] by the gain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipPolicy {
    /// Clamp every sample to [-1.0, 1.0] after scaling
    #[default]
    Clamp,
    /// Leave scaled samples as they are (only survives float WAV output)
    Allow,
}

/// Normalization configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationConfig {
    /// Target RMS level in dBFS (default: -20.0, i.e. RMS 0.1)
    pub target_db: f32,

    /// Post-gain clipping policy (default: Clamp)
    pub clip: ClipPolicy,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            target_db: -20.0,
            clip: ClipPolicy::Clamp,
        }
    }
}

impl NormalizationConfig {
    /// Reject non-finite targets
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.target_db.is_finite() {
            return Err(PipelineError::InvalidInput(format!(
                "Target level must be finite, got {}",
                self.target_db
            )));
        }
        Ok(())
    }

    /// Target RMS as a linear amplitude
    pub fn target_rms(&self) -> f64 {
        10.0_f64.powf(self.target_db as f64 / 20.0)
    }
}

/// Loudness information returned from normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GainReport {
    /// RMS level in dBFS before normalization (-inf for silence)
    pub rms_db: f64,
    /// Gain applied in dB (0.0 when the buffer was silent)
    pub gain_db: f64,
    /// Samples that exceeded full scale after gain
    pub clipped_samples: usize,
}

/// Normalize audio samples in place to the configured RMS level
///
/// A silent (all-zero) or empty buffer is left untouched with a gain of 1.
///
/// # Errors
///
/// Returns `PipelineError::InvalidInput` if the target is not finite
pub fn normalize(
    samples: &mut [f32],
    config: &NormalizationConfig,
) -> Result<GainReport, PipelineError> {
    config.validate()?;

    let rms = if samples.is_empty() {
        0.0
    } else {
        let sum_sq: f64 = samples.iter().map(|&x| (x as f64) * (x as f64)).sum();
        (sum_sq / samples.len() as f64).sqrt()
    };

    if rms <= 0.0 {
        log::debug!("Audio is silent, skipping normalization");
        return Ok(GainReport {
            rms_db: f64::NEG_INFINITY,
            gain_db: 0.0,
            clipped_samples: 0,
        });
    }

    let rms_db = 20.0 * rms.log10();
    let gain = config.target_rms() / rms;
    let gain_db = 20.0 * gain.log10();

    let mut clipped_samples = 0;
    for sample in samples.iter_mut() {
        let scaled = (*sample as f64 * gain) as f32;
        if scaled.abs() > 1.0 {
            clipped_samples += 1;
        }
        *sample = match config.clip {
            ClipPolicy::Clamp => scaled.clamp(-1.0, 1.0),
            ClipPolicy::Allow => scaled,
        };
    }

    if clipped_samples > 0 {
        log::warn!(
            "RMS normalization pushed {} samples past full scale ({:?})",
            clipped_samples,
            config.clip
        );
    }

    log::debug!(
        "RMS normalization: rms={:.2} dB, target={:.2} dB, gain={:.2} dB",
        rms_db,
        config.target_db,
        gain_db
    );

    Ok(GainReport {
        rms_db,
        gain_db,
        clipped_samples,
    })
}

/// Normalize a WAV file and write the result
///
/// The output keeps the input's sample rate. Parent directories of `output`
/// are created as needed.
pub fn normalize_file(
    input: &Path,
    output: &Path,
    config: &NormalizationConfig,
    encoding: WavEncoding,
) -> Result<GainReport, PipelineError> {
    let mut buffer = load_wav(input)?;
    let report = normalize(&mut buffer.samples, config)?;

    let peak = buffer.peak();
    if peak > 1.0 && encoding == WavEncoding::Pcm16 {
        log::warn!(
            "{}: peak {:.3} exceeds full scale and will saturate in 16-bit output",
            output.display(),
            peak
        );
    }
    save_wav(output, &buffer, encoding)?;

    log::debug!(
        "Normalized {} -> {}: gain {:.2} dB, peak {:.3}",
        input.display(),
        output.display(),
        report.gain_db,
        peak
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Generate a test signal: sine wave at 440 Hz
    fn generate_test_signal(length: usize, amplitude: f32, sample_rate: f32) -> Vec<f32> {
        let freq = 440.0;
        (0..length)
            .map(|i| {
                let t = i as f32 / sample_rate;
                amplitude * (2.0 * std::f32::consts::PI * freq * t).sin()
            })
            .collect()
    }

    fn rms(samples: &[f32]) -> f64 {
        let sum_sq: f64 = samples.iter().map(|&x| (x as f64) * (x as f64)).sum();
        (sum_sq / samples.len() as f64).sqrt()
    }

    #[test]
    fn test_rms_reaches_target() {
        let mut samples = generate_test_signal(16000, 0.3, 16000.0);
        let report = normalize(&mut samples, &NormalizationConfig::default()).unwrap();

        let out_rms = rms(&samples);
        assert!(
            (out_rms - 0.1).abs() < 1e-4,
            "RMS normalization failed: expected ~0.100, got {:.5}",
            out_rms
        );
        assert_eq!(report.clipped_samples, 0);
        assert!(report.gain_db < 0.0, "0.3 sine is louder than -20 dB");
    }

    #[test]
    fn test_quiet_signal_is_raised() {
        let mut samples = generate_test_signal(16000, 0.01, 16000.0);
        let config = NormalizationConfig {
            target_db: -12.0,
            ..Default::default()
        };
        let report = normalize(&mut samples, &config).unwrap();

        let target = 10.0_f64.powf(-12.0 / 20.0);
        assert!((rms(&samples) - target).abs() < 1e-4);
        assert!(report.gain_db > 0.0);
        assert!((report.rms_db - 20.0 * (0.01 / 2.0_f64.sqrt()).log10()).abs() < 0.01);
    }

    #[test]
    fn test_silent_audio() {
        let mut samples = vec![0.0f32; 16000];
        let report = normalize(&mut samples, &NormalizationConfig::default()).unwrap();

        assert_eq!(report.gain_db, 0.0, "Silent audio should not apply gain");
        assert_eq!(report.rms_db, f64::NEG_INFINITY);
        assert!(samples.iter().all(|&s| s == 0.0 && !s.is_nan()));
    }

    #[test]
    fn test_empty_samples() {
        let mut samples: Vec<f32> = vec![];
        let report = normalize(&mut samples, &NormalizationConfig::default()).unwrap();
        assert_eq!(report.gain_db, 0.0);
    }

    /// Mostly quiet signal with one loud spike: reaching 0 dB RMS overshoots the spike
    fn spiky_signal() -> Vec<f32> {
        let mut samples = vec![0.01f32; 1000];
        samples[500] = 0.5;
        samples
    }

    #[test]
    fn test_clamp_policy_limits_peaks() {
        let mut samples = spiky_signal();
        let config = NormalizationConfig {
            target_db: 0.0,
            clip: ClipPolicy::Clamp,
        };
        let report = normalize(&mut samples, &config).unwrap();

        assert!(report.clipped_samples >= 1);
        assert!(samples.iter().all(|&s| s.abs() <= 1.0));
    }

    #[test]
    fn test_allow_policy_keeps_overshoot() {
        let mut samples = spiky_signal();
        let config = NormalizationConfig {
            target_db: 0.0,
            clip: ClipPolicy::Allow,
        };
        let report = normalize(&mut samples, &config).unwrap();

        assert!(report.clipped_samples >= 1);
        assert!(samples[500] > 1.0);
        assert!((rms(&samples) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_non_finite_target_rejected() {
        let mut samples = vec![0.1f32; 10];
        let config = NormalizationConfig {
            target_db: f32::INFINITY,
            ..Default::default()
        };
        assert!(normalize(&mut samples, &config).is_err());
    }

    #[test]
    fn test_target_rms_conversion() {
        let config = NormalizationConfig::default();
        assert!((config.target_rms() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_file_peaks_by_encoding() {
        use crate::io::AudioBuffer;

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("spiky.wav");
        let mut samples = vec![0.001f32; 1000];
        samples[500] = 0.5;
        save_wav(&input, &AudioBuffer::new(samples, 16000), WavEncoding::Float32).unwrap();

        let config = NormalizationConfig {
            target_db: 0.0,
            clip: ClipPolicy::Allow,
        };

        let float_out = dir.path().join("float/spiky.wav");
        normalize_file(&input, &float_out, &config, WavEncoding::Float32).unwrap();
        let written = load_wav(&float_out).unwrap();
        assert_eq!(written.sample_rate, 16000);
        assert!(written.peak() > 1.0);

        let pcm_out = dir.path().join("pcm/spiky.wav");
        let report = normalize_file(&input, &pcm_out, &config, WavEncoding::Pcm16).unwrap();
        assert!(report.clipped_samples >= 1);
        assert!(load_wav(&pcm_out).unwrap().peak() <= 1.0);
    }
}
