//! Per-file and per-stage outcome reports

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::PipelineError;
use crate::preprocessing::normalization::GainReport;
use crate::preprocessing::silence::TrimSummary;

/// One of the three file transforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Transcode to mono WAV at the configured rate
    Convert,
    /// Drop silent intervals
    Trim,
    /// Scale to the target RMS level
    Normalize,
}

impl Stage {
    /// Stage name as used on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Convert => "convert",
            Stage::Trim => "trim",
            Stage::Normalize => "normalize",
        }
    }

    /// Subdirectory of the output root this stage writes to in `all` mode
    pub fn subdir(&self) -> &'static str {
        match self {
            Stage::Convert => "wav16",
            Stage::Trim => "trimmed",
            Stage::Normalize => "normalized",
        }
    }

    /// Progress bar message
    pub fn progress_message(&self) -> &'static str {
        match self {
            Stage::Convert => "Converting to WAV",
            Stage::Trim => "Trimming silence",
            Stage::Normalize => "Normalizing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stage-specific details of a successful file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FileDetail {
    /// Transcoded by the named backend
    Transcoded {
        /// Backend name
        backend: &'static str,
    },
    /// Trim statistics
    Trimmed(TrimSummary),
    /// Gain statistics
    Normalized(GainReport),
}

/// Outcome of one file in one stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileRecord {
    /// Stage that processed the file
    pub stage: Stage,
    /// Source file
    pub input: PathBuf,
    /// Destination file (may be missing or partial on error)
    pub output: PathBuf,
    /// Details on success
    #[serde(skip_serializing_if = "Option::is_none", flatten)]
    pub detail: Option<FileDetail>,
    /// Error message on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileRecord {
    /// Whether the file was processed without error
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of one stage over a directory tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    /// Stage that ran
    pub stage: Stage,
    /// Directory scanned for inputs
    pub input_root: PathBuf,
    /// Directory outputs were mirrored into
    pub output_root: PathBuf,
    /// One record per discovered file, in processing order
    pub files: Vec<FileRecord>,
    /// Wall time in milliseconds
    pub elapsed_ms: f64,
}

impl StageReport {
    /// Files processed without error
    pub fn succeeded(&self) -> usize {
        self.files.iter().filter(|f| f.is_ok()).count()
    }

    /// Files that failed
    pub fn failed(&self) -> usize {
        self.files.len() - self.succeeded()
    }

    /// Output paths of the files processed without error, in processing order
    pub fn outputs(&self) -> Vec<PathBuf> {
        self.files
            .iter()
            .filter(|f| f.is_ok())
            .map(|f| f.output.clone())
            .collect()
    }
}

/// Outcome of a whole run (one stage, or three for `all`)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    /// Stage reports in execution order
    pub stages: Vec<StageReport>,
}

impl BatchReport {
    /// Files attempted across all stages
    pub fn total(&self) -> usize {
        self.stages.iter().map(|s| s.files.len()).sum()
    }

    /// Files failed across all stages
    pub fn failed(&self) -> usize {
        self.stages.iter().map(StageReport::failed).sum()
    }

    /// Every failed record, in order
    pub fn failures(&self) -> impl Iterator<Item = &FileRecord> {
        self.stages
            .iter()
            .flat_map(|s| s.files.iter())
            .filter(|f| !f.is_ok())
    }

    /// `Ok` when no file failed, otherwise `FilesFailed` naming the first
    /// stage with failures and the run-wide counts
    pub fn ensure_success(&self) -> Result<(), PipelineError> {
        match self.stages.iter().find(|s| s.failed() > 0) {
            None => Ok(()),
            Some(first) => Err(PipelineError::FilesFailed {
                stage: first.stage.name().to_string(),
                failed: self.failed(),
                total: self.total(),
            }),
        }
    }
}
