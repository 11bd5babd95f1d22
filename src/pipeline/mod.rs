//! Batch orchestration over directory trees
//!
//! Each stage walks an input root, mirrors every matching file's relative
//! path under an output root and runs the stage's transform on it. Files are
//! processed one at a time; a failing file is recorded and skipped.
//!
//! ```text
//! all:  data_root --convert--> out/wav16 --trim--> out/trimmed --normalize--> out/normalized
//! ```

pub mod discovery;
pub mod report;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};

pub use discovery::{discover, mirror_path, OUTPUT_EXTENSION};
pub use report::{BatchReport, FileDetail, FileRecord, Stage, StageReport};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::preprocessing::normalization::normalize_file;
use crate::preprocessing::silence::trim_file;
use crate::transcode::Transcoder;

/// What a run does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Transcode source files into the output root
    Convert,
    /// Trim WAV files into the output root
    Trim,
    /// Normalize WAV files into the output root
    Normalize,
    /// Convert, trim and normalize into `wav16/`, `trimmed/`, `normalized/`
    All,
}

impl Mode {
    /// Mode name as used on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Convert => "convert",
            Mode::Trim => "trim",
            Mode::Normalize => "normalize",
            Mode::All => "all",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn progress_bar(stage: Stage, len: usize, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(stage.progress_message());
    pb
}

/// Run one stage of the pipeline over every matching file in `input_root`
///
/// `convert` picks up files with the configured source extension; `trim` and
/// `normalize` pick up `.wav` files. Per-file failures are recorded in the
/// report and do not stop the stage.
///
/// # Errors
///
/// Returns `PipelineError` only for stage-level problems: invalid
/// configuration or an input root that is not a directory.
pub fn run_stage(
    stage: Stage,
    input_root: &Path,
    output_root: &Path,
    config: &PipelineConfig,
) -> Result<StageReport, PipelineError> {
    config.validate()?;

    let extension = match stage {
        Stage::Convert => config.transcode.source_extension.as_str(),
        Stage::Trim | Stage::Normalize => OUTPUT_EXTENSION,
    };
    let files = discover(input_root, extension)?;

    run_stage_on(stage, input_root, &files, output_root, config)
}

/// Run one stage over an explicit list of files under `input_root`
///
/// Each file's output mirrors its path relative to `input_root`. When a file
/// fails, any output left at its mirrored path (partial, or from an earlier
/// run) is removed so the output tree only holds files this run produced.
///
/// # Errors
///
/// Returns `PipelineError` for invalid configuration or a file that does not
/// live under `input_root`.
pub fn run_stage_on(
    stage: Stage,
    input_root: &Path,
    files: &[PathBuf],
    output_root: &Path,
    config: &PipelineConfig,
) -> Result<StageReport, PipelineError> {
    config.validate()?;
    let start_time = Instant::now();

    log::info!(
        "{}: {} files from {} into {}",
        stage,
        files.len(),
        input_root.display(),
        output_root.display()
    );

    let transcoder: Option<Box<dyn Transcoder>> = match stage {
        Stage::Convert => Some(config.transcode.build(config.encoding)),
        _ => None,
    };

    let pb = progress_bar(stage, files.len(), config.quiet);
    let mut records = Vec::with_capacity(files.len());

    for file in files {
        let output = mirror_path(input_root, file, output_root)?;

        let result = match (stage, transcoder.as_deref()) {
            (Stage::Convert, Some(t)) => t
                .transcode(file, &output)
                .map(|()| FileDetail::Transcoded { backend: t.name() }),
            (Stage::Trim, _) => {
                trim_file(file, &output, &config.silence, config.encoding).map(FileDetail::Trimmed)
            }
            (Stage::Normalize, _) => {
                normalize_file(file, &output, &config.normalization, config.encoding)
                    .map(FileDetail::Normalized)
            }
            (Stage::Convert, None) => Err(PipelineError::InvalidInput(
                "No transcoder configured".to_string(),
            )),
        };

        let record = match result {
            Ok(detail) => FileRecord {
                stage,
                input: file.clone(),
                output,
                detail: Some(detail),
                error: None,
            },
            Err(e) => {
                pb.suspend(|| {
                    log::error!("{} failed on {}: {}", stage, file.display(), e);
                    remove_stale_output(file, &output);
                });
                FileRecord {
                    stage,
                    input: file.clone(),
                    output,
                    detail: None,
                    error: Some(e.to_string()),
                }
            }
        };
        records.push(record);
        pb.inc(1);
    }

    pb.finish_with_message(format!("{} done", stage.progress_message()));

    let report = StageReport {
        stage,
        input_root: input_root.to_path_buf(),
        output_root: output_root.to_path_buf(),
        files: records,
        elapsed_ms: start_time.elapsed().as_secs_f64() * 1000.0,
    };

    log::info!(
        "{}: ok={}/{} failed={} wall={:.0}ms",
        stage,
        report.succeeded(),
        report.files.len(),
        report.failed(),
        report.elapsed_ms
    );

    Ok(report)
}

/// Delete whatever a failed file left at its output path
///
/// Never touches `output` when it is the input itself (in-place runs).
fn remove_stale_output(input: &Path, output: &Path) {
    if output == input || !output.is_file() {
        return;
    }
    match fs::remove_file(output) {
        Ok(()) => log::debug!("Removed stale output {}", output.display()),
        Err(e) => log::warn!("Could not remove stale output {}: {}", output.display(), e),
    }
}

/// Run a mode end to end
///
/// Single-stage modes read `data_root` and write `out_root` directly. `all`
/// runs the three stages in order with a barrier between them: every file is
/// converted before any is trimmed, and so on. Each later stage works on
/// exactly the files the previous stage wrote in this run, so a file that
/// fails one stage is not picked up by the next.
///
/// The returned report may contain failed files; call
/// [`BatchReport::ensure_success`] to turn those into an error.
pub fn run_mode(
    mode: Mode,
    data_root: &Path,
    out_root: &Path,
    config: &PipelineConfig,
) -> Result<BatchReport, PipelineError> {
    let mut report = BatchReport::default();

    match mode {
        Mode::Convert => report
            .stages
            .push(run_stage(Stage::Convert, data_root, out_root, config)?),
        Mode::Trim => report
            .stages
            .push(run_stage(Stage::Trim, data_root, out_root, config)?),
        Mode::Normalize => report
            .stages
            .push(run_stage(Stage::Normalize, data_root, out_root, config)?),
        Mode::All => {
            let convert_root = out_root.join(Stage::Convert.subdir());
            let mut previous = run_stage(Stage::Convert, data_root, &convert_root, config)?;

            for stage in [Stage::Trim, Stage::Normalize] {
                let input_root = previous.output_root.clone();
                let files = previous.outputs();
                let output_root = out_root.join(stage.subdir());
                let current = run_stage_on(stage, &input_root, &files, &output_root, config)?;
                report.stages.push(previous);
                previous = current;
            }
            report.stages.push(previous);
        }
    }

    Ok(report)
}
