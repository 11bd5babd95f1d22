//! Error types for the preprocessing pipeline

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors that can occur while preprocessing audio files
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid input parameters or configuration
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Filesystem error (permission denied, disk full, missing file)
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// WAV read or write error
    #[error("WAV error on {}: {source}", .path.display())]
    Wav {
        /// Path being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: hound::Error,
    },

    /// Audio decoding error from the in-process decoder
    #[error("Decoding error on {}: {source}", .path.display())]
    Decode {
        /// Path being decoded
        path: PathBuf,
        /// Underlying error
        #[source]
        source: symphonia::core::errors::Error,
    },

    /// The container holds no decodable audio track
    #[error("No supported audio track in {}", .0.display())]
    NoAudioTrack(PathBuf),

    /// Resampler construction or processing failed
    #[error("Resampling error: {0}")]
    Resample(String),

    /// The external transcoder could not be started
    #[error("Transcoder `{program}` could not be started: {source}")]
    TranscoderUnavailable {
        /// Program that was invoked
        program: String,
        /// Spawn error
        #[source]
        source: std::io::Error,
    },

    /// The external transcoder ran but did not produce its output
    #[error("Transcoder failed on {} ({status}): {stderr}", .path.display())]
    TranscoderFailed {
        /// Source file that was being transcoded
        path: PathBuf,
        /// Exit status reported by the process
        status: ExitStatus,
        /// Tail of the process's diagnostic output
        stderr: String,
    },

    /// One or more files failed during a batch stage
    #[error("{failed} of {total} files failed during {stage}")]
    FilesFailed {
        /// Stage name
        stage: String,
        /// Number of failed files
        failed: usize,
        /// Number of files attempted
        total: usize,
    },
}

impl PipelineError {
    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a WAV error with the path it occurred on
    pub fn wav(path: impl Into<PathBuf>, source: hound::Error) -> Self {
        PipelineError::Wav {
            path: path.into(),
            source,
        }
    }

    /// Wrap a decoder error with the path it occurred on
    pub fn decode(path: impl Into<PathBuf>, source: symphonia::core::errors::Error) -> Self {
        PipelineError::Decode {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_names_path() {
        let err = PipelineError::io(
            "out/trimmed/a/x.wav",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("out/trimmed/a/x.wav"), "got: {}", msg);
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_files_failed_message() {
        let err = PipelineError::FilesFailed {
            stage: "trim".to_string(),
            failed: 2,
            total: 5,
        };
        assert_eq!(err.to_string(), "2 of 5 files failed during trim");
    }
}
