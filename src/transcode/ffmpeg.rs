//! External ffmpeg backend

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Stdio};

use super::Transcoder;
use crate::error::PipelineError;
use crate::io::{ensure_parent_dir, WavEncoding};

/// Lines of ffmpeg stderr kept in a failure report
const STDERR_TAIL_LINES: usize = 20;

/// Runs `ffmpeg -y -i <input> -ar <rate> -ac 1 <output>`
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: String,
    sample_rate: u32,
    encoding: WavEncoding,
}

impl FfmpegTranscoder {
    /// Create a backend invoking `program`
    pub fn new(program: impl Into<String>, sample_rate: u32, encoding: WavEncoding) -> Self {
        Self {
            program: program.into(),
            sample_rate,
            encoding,
        }
    }

    /// Arguments passed to the transcoder process
    pub fn args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-y".into(),
            "-i".into(),
            input.as_os_str().to_owned(),
            "-ar".into(),
            self.sample_rate.to_string().into(),
            "-ac".into(),
            "1".into(),
        ];
        // ffmpeg writes 16-bit PCM to .wav unless told otherwise
        if self.encoding == WavEncoding::Float32 {
            args.push("-c:a".into());
            args.push("pcm_f32le".into());
        }
        args.push(output.as_os_str().to_owned());
        args
    }
}

/// Last few lines of a process's stderr
fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn transcode(&self, input: &Path, output: &Path) -> Result<(), PipelineError> {
        ensure_parent_dir(output)?;

        log::debug!(
            "Running {} on {} -> {}",
            self.program,
            input.display(),
            output.display()
        );

        let result = Command::new(&self.program)
            .args(self.args(input, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                    PipelineError::TranscoderUnavailable {
                        program: self.program.clone(),
                        source: e,
                    }
                }
                _ => PipelineError::io(input, e),
            })?;

        if !result.status.success() {
            return Err(PipelineError::TranscoderFailed {
                path: input.to_path_buf(),
                status: result.status,
                stderr: stderr_tail(&result.stderr),
            });
        }

        if !output.is_file() {
            return Err(PipelineError::TranscoderFailed {
                path: input.to_path_buf(),
                status: result.status,
                stderr: format!("no output written to {}", output.display()),
            });
        }

        Ok(())
    }
}
