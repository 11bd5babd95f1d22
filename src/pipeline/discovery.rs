//! Input discovery and output path mirroring

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::PipelineError;

/// Extension given to every derived artifact
pub const OUTPUT_EXTENSION: &str = "wav";

/// Recursively find files under `root` whose extension matches `extension`
///
/// Matching ignores case and a leading dot in `extension`. Results are sorted
/// so repeated runs visit files in the same order. Unreadable directory
/// entries are logged and skipped.
///
/// # Errors
///
/// Returns `PipelineError::InvalidInput` if `root` is not a directory
pub fn discover(root: &Path, extension: &str) -> Result<Vec<PathBuf>, PipelineError> {
    if !root.is_dir() {
        return Err(PipelineError::InvalidInput(format!(
            "Input path is not a directory: {}",
            root.display()
        )));
    }

    let wanted = extension.trim_start_matches('.').to_lowercase();
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.to_lowercase() == wanted);
        if matches {
            files.push(entry.into_path());
        }
    }

    files.sort();
    log::debug!(
        "Found {} .{} files under {}",
        files.len(),
        wanted,
        root.display()
    );
    Ok(files)
}

/// Output path for `file`: its path relative to `input_root`, placed under
/// `output_root`, with the extension replaced by `wav`
///
/// # Errors
///
/// Returns `PipelineError::InvalidInput` if `file` is not under `input_root`
pub fn mirror_path(
    input_root: &Path,
    file: &Path,
    output_root: &Path,
) -> Result<PathBuf, PipelineError> {
    let relative = file.strip_prefix(input_root).map_err(|_| {
        PipelineError::InvalidInput(format!(
            "{} is not under {}",
            file.display(),
            input_root.display()
        ))
    })?;
    Ok(output_root
        .join(relative)
        .with_extension(OUTPUT_EXTENSION))
}
