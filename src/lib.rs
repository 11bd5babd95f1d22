//! # wavprep
//!
//! Batch audio preprocessing for speech-dataset preparation: transcode source
//! files to mono 16 kHz WAV, trim silence, and normalize loudness, mirroring
//! the input directory tree at every stage.
//!
//! ## Features
//!
//! - **Transcoding**: external `ffmpeg` (default) or in-process Symphonia decode + rubato resample
//! - **Silence trimming**: frame-energy split relative to the loudest frame, non-silent runs concatenated
//! - **Loudness normalization**: single global gain to a target RMS level, with an explicit clipping policy
//! - **Batch orchestration**: per-file error isolation, progress bars, JSON-serializable reports
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use wavprep::{run_mode, Mode, PipelineConfig};
//!
//! let config = PipelineConfig::default();
//! let report = run_mode(Mode::All, Path::new("data"), Path::new("out"), &config)?;
//!
//! println!("{} files, {} failed", report.total(), report.failed());
//! report.ensure_success()?;
//! # Ok::<(), wavprep::PipelineError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! data_root → Transcode → out/wav16 → Trim → out/trimmed → Normalize → out/normalized
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod preprocessing;
pub mod transcode;

use std::path::Path;

// Re-export main types
pub use config::PipelineConfig;
pub use error::PipelineError;
pub use io::{AudioBuffer, WavEncoding};
pub use pipeline::{
    run_mode, run_stage, run_stage_on, BatchReport, FileRecord, Mode, Stage, StageReport,
};
pub use preprocessing::normalization::{normalize_file, ClipPolicy, GainReport, NormalizationConfig};
pub use preprocessing::silence::{trim_file, SilenceDetector, TrimSummary};
pub use transcode::{TranscodeConfig, Transcoder, TranscoderKind};

/// Transcode a single file with the configured backend
///
/// Produces a mono WAV at `config.transcode.sample_rate`, creating the
/// parent directory of `output` first.
///
/// # Errors
///
/// Returns `PipelineError` if the configuration is invalid or the backend
/// fails (missing `ffmpeg`, non-zero exit, undecodable input).
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use wavprep::{transcode_file, PipelineConfig};
///
/// transcode_file(Path::new("clip.mp3"), Path::new("clip.wav"), &PipelineConfig::default())?;
/// # Ok::<(), wavprep::PipelineError>(())
/// ```
pub fn transcode_file(
    input: &Path,
    output: &Path,
    config: &PipelineConfig,
) -> Result<(), PipelineError> {
    config.transcode.validate()?;
    config
        .transcode
        .build(config.encoding)
        .transcode(input, output)
}
