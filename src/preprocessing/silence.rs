//! Silence detection and trimming utilities
//!
//! Splits a signal into non-silent intervals using frame energy relative to
//! the loudest frame, then concatenates those intervals.
//!
//! Algorithm:
//! 1. Pad the signal with `frame_length / 2` zeros on both sides (centered frames)
//! 2. Compute mean-square power for frames of `frame_length` every `hop_length`
//! 3. Convert power to dB relative to the loudest frame
//! 4. Frames above `-top_db` are non-silent; runs of them become sample intervals
//!
//! # Example
//!
//! ```no_run
//! use wavprep::preprocessing::silence::{detect_and_trim, SilenceDetector};
//!
//! let samples = vec![0.0f32; 16000];
//! let (trimmed, intervals) = detect_and_trim(&samples, &SilenceDetector::default())?;
//! assert!(trimmed.len() <= samples.len());
//! # Ok::<(), wavprep::PipelineError>(())
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::io::{load_wav, save_wav, AudioBuffer, WavEncoding};

/// Floor applied to frame power and reference before taking logarithms
const AMIN: f64 = 1e-10;

/// Silence detection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SilenceDetector {
    /// Threshold in dB below the loudest frame (default: 30.0)
    /// Frames quieter than this relative to the peak frame are silent
    pub top_db: f32,

    /// Frame size in samples (default: 2048)
    pub frame_length: usize,

    /// Hop size between frames in samples (default: 512)
    pub hop_length: usize,
}

impl Default for SilenceDetector {
    fn default() -> Self {
        Self {
            top_db: 30.0,
            frame_length: 2048,
            hop_length: 512,
        }
    }
}

impl SilenceDetector {
    /// Check that frame geometry and threshold are usable
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.frame_length == 0 {
            return Err(PipelineError::InvalidInput(
                "Frame length must be > 0".to_string(),
            ));
        }
        if self.hop_length == 0 {
            return Err(PipelineError::InvalidInput(
                "Hop length must be > 0".to_string(),
            ));
        }
        if !self.top_db.is_finite() {
            return Err(PipelineError::InvalidInput(format!(
                "Silence threshold must be finite, got {}",
                self.top_db
            )));
        }
        Ok(())
    }
}

/// What a trim pass did to one buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrimSummary {
    /// Samples before trimming
    pub input_samples: usize,
    /// Samples after trimming
    pub output_samples: usize,
    /// Number of non-silent intervals kept (0 means the buffer was kept whole)
    pub intervals: usize,
    /// Duration of the written audio in seconds
    pub output_seconds: f32,
}

/// Mean-square power of centered frames
///
/// Frame `i` covers padded indices `[i * hop, i * hop + frame_length)` where
/// the padding is `frame_length / 2` zeros on each side. Padding counts
/// toward the mean, so edge frames read quieter.
pub fn frame_power(samples: &[f32], frame_length: usize, hop_length: usize) -> Vec<f64> {
    let n = samples.len();
    let pad = frame_length / 2;
    let padded_len = n + 2 * pad;
    if frame_length == 0 || hop_length == 0 || padded_len < frame_length {
        return Vec::new();
    }
    let num_frames = 1 + (padded_len - frame_length) / hop_length;

    // prefix[k] = sum of squares of samples[..k]
    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0f64);
    let mut acc = 0.0f64;
    for &x in samples {
        acc += (x as f64) * (x as f64);
        prefix.push(acc);
    }

    (0..num_frames)
        .map(|i| {
            let start = (i * hop_length).saturating_sub(pad).min(n);
            let end = (i * hop_length + frame_length).saturating_sub(pad).min(n);
            (prefix[end] - prefix[start]) / frame_length as f64
        })
        .collect()
}

/// Find non-silent intervals in a buffer
///
/// # Returns
///
/// Ordered, non-overlapping `(start, end)` sample ranges, end exclusive.
/// Empty input yields no intervals.
///
/// # Errors
///
/// Returns `PipelineError::InvalidInput` if the detector is misconfigured
pub fn split_nonsilent(
    samples: &[f32],
    detector: &SilenceDetector,
) -> Result<Vec<(usize, usize)>, PipelineError> {
    detector.validate()?;

    if samples.is_empty() {
        return Ok(Vec::new());
    }

    let power = frame_power(samples, detector.frame_length, detector.hop_length);
    let reference = power.iter().cloned().fold(0.0f64, f64::max);
    let ref_db = 10.0 * reference.max(AMIN).log10();
    let threshold = -(detector.top_db as f64);

    let non_silent: Vec<bool> = power
        .iter()
        .map(|&p| 10.0 * p.max(AMIN).log10() - ref_db > threshold)
        .collect();

    let n = samples.len();
    let hop = detector.hop_length;
    let mut intervals = Vec::new();
    let mut run_start: Option<usize> = None;

    for (frame, &loud) in non_silent.iter().enumerate() {
        match (loud, run_start) {
            (true, None) => run_start = Some(frame),
            (false, Some(start)) => {
                intervals.push((start * hop, frame * hop));
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        intervals.push((start * hop, non_silent.len() * hop));
    }

    // Frame edges can land past the last sample
    let intervals: Vec<(usize, usize)> = intervals
        .into_iter()
        .map(|(s, e)| (s.min(n), e.min(n)))
        .filter(|(s, e)| s < e)
        .collect();

    log::debug!(
        "Silence split: {} samples, {} frames, top_db={:.1}, {} intervals",
        n,
        power.len(),
        detector.top_db,
        intervals.len()
    );

    Ok(intervals)
}

/// Detect and trim silence from audio
///
/// # Arguments
///
/// * `samples` - Audio samples
/// * `detector` - Silence detection configuration
///
/// # Returns
///
/// Trimmed samples and the non-silent intervals they were built from. When no
/// interval is found the input is returned unchanged with an empty interval
/// list.
pub fn detect_and_trim(
    samples: &[f32],
    detector: &SilenceDetector,
) -> Result<(Vec<f32>, Vec<(usize, usize)>), PipelineError> {
    let intervals = split_nonsilent(samples, detector)?;

    if intervals.is_empty() {
        log::warn!(
            "No non-silent intervals in {} samples, keeping buffer unchanged",
            samples.len()
        );
        return Ok((samples.to_vec(), intervals));
    }

    let kept: usize = intervals.iter().map(|(s, e)| e - s).sum();
    let mut trimmed = Vec::with_capacity(kept);
    for &(start, end) in &intervals {
        trimmed.extend_from_slice(&samples[start..end]);
    }

    Ok((trimmed, intervals))
}

/// Trim silence from a WAV file and write the result
///
/// The output keeps the input's sample rate. Parent directories of `output`
/// are created as needed.
pub fn trim_file(
    input: &Path,
    output: &Path,
    detector: &SilenceDetector,
    encoding: WavEncoding,
) -> Result<TrimSummary, PipelineError> {
    let buffer = load_wav(input)?;
    let (trimmed, intervals) = detect_and_trim(&buffer.samples, detector)?;

    let trimmed = AudioBuffer::new(trimmed, buffer.sample_rate);

    let summary = TrimSummary {
        input_samples: buffer.len(),
        output_samples: trimmed.len(),
        intervals: intervals.len(),
        output_seconds: trimmed.duration_seconds(),
    };

    save_wav(output, &trimmed, encoding)?;

    log::debug!(
        "Trimmed {} -> {}: {} -> {} samples ({:.2}s)",
        input.display(),
        output.display(),
        summary.input_samples,
        summary.output_samples,
        summary.output_seconds
    );

    Ok(summary)
}
