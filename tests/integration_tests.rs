//! Integration tests for the preprocessing pipeline

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use wavprep::{
    run_mode, AudioBuffer, Mode, PipelineConfig, PipelineError, TranscoderKind, WavEncoding,
};

/// Load a WAV file and return (samples, sample_rate, channels)
fn load_wav(path: &Path) -> Result<(Vec<f32>, u32, u16), Box<dyn std::error::Error>> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let max_value = (1 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_value))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok((samples, spec.sample_rate, spec.channels))
}

/// Write a stereo 16-bit WAV: silence, tone, silence
fn write_source(path: &Path, sample_rate: u32, amplitude: f32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let second = sample_rate as usize;
    for i in 0..3 * second {
        let s = if (second..2 * second).contains(&i) {
            amplitude * (2.0 * std::f32::consts::PI * 220.0 * i as f32 / sample_rate as f32).sin()
        } else {
            0.0
        };
        let v = (s * i16::MAX as f32) as i16;
        writer.write_sample(v).unwrap();
        writer.write_sample(v).unwrap();
    }
    writer.finalize().unwrap();
}

fn rms(samples: &[f32]) -> f64 {
    let sum_sq: f64 = samples.iter().map(|&x| (x as f64) * (x as f64)).sum();
    (sum_sq / samples.len() as f64).sqrt()
}

/// Native backend reading `.wav` sources, so no external program is needed
fn native_config() -> PipelineConfig {
    let mut config = PipelineConfig {
        quiet: true,
        ..Default::default()
    };
    config.transcode.backend = TranscoderKind::Native;
    config.transcode.source_extension = "wav".to_string();
    config
}

fn ffmpeg_available() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn relative_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(root).unwrap().to_path_buf())
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_mode_mirrors_tree() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        let out = dir.path().join("out");
        write_source(&data.join("a/x.wav"), 44100, 0.5);
        write_source(&data.join("b/y.wav"), 22050, 0.05);

        let report = run_mode(Mode::All, &data, &out, &native_config()).unwrap();
        assert!(report.ensure_success().is_ok(), "{:?}", report);
        assert_eq!(report.stages.len(), 3);
        assert_eq!(report.total(), 6);

        for stage in ["wav16", "trimmed", "normalized"] {
            assert_eq!(
                relative_files(&out.join(stage)),
                vec![PathBuf::from("a/x.wav"), PathBuf::from("b/y.wav")],
                "stage {}",
                stage
            );
            for name in ["a/x.wav", "b/y.wav"] {
                let (_, sample_rate, channels) = load_wav(&out.join(stage).join(name)).unwrap();
                assert_eq!(channels, 1, "{}/{}", stage, name);
                assert_eq!(sample_rate, 16000, "{}/{}", stage, name);
            }
        }
    }

    #[test]
    fn test_all_mode_trims_and_normalizes() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        let out = dir.path().join("out");
        write_source(&data.join("clip.wav"), 16000, 0.05);

        run_mode(Mode::All, &data, &out, &native_config())
            .unwrap()
            .ensure_success()
            .unwrap();

        let (converted, _, _) = load_wav(&out.join("wav16/clip.wav")).unwrap();
        let (trimmed, _, _) = load_wav(&out.join("trimmed/clip.wav")).unwrap();
        let (normalized, _, _) = load_wav(&out.join("normalized/clip.wav")).unwrap();

        assert_eq!(converted.len(), 48000);
        // one second of tone plus at most a few frames of padding on each side
        assert!(trimmed.len() < converted.len());
        assert!(trimmed.len() >= 16000 && trimmed.len() < 16000 + 4 * 2048);
        assert_eq!(normalized.len(), trimmed.len());
        assert!(
            (rms(&normalized) - 0.1).abs() < 1e-3,
            "normalized rms {:.5}",
            rms(&normalized)
        );
    }

    #[test]
    fn test_rerun_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        let out = dir.path().join("out");
        write_source(&data.join("a/x.wav"), 16000, 0.3);

        let config = native_config();
        run_mode(Mode::All, &data, &out, &config).unwrap();
        let first = std::fs::read(out.join("normalized/a/x.wav")).unwrap();
        run_mode(Mode::All, &data, &out, &config).unwrap();
        let second = std::fs::read(out.join("normalized/a/x.wav")).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_trim_mode_keeps_silent_file() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        let out = dir.path().join("out");
        wavprep::io::save_wav(
            data.join("silent.wav"),
            &AudioBuffer::new(vec![0.0; 12345], 16000),
            WavEncoding::Pcm16,
        )
        .unwrap();

        run_mode(Mode::Trim, &data, &out, &native_config())
            .unwrap()
            .ensure_success()
            .unwrap();

        let (samples, sample_rate, _) = load_wav(&out.join("silent.wav")).unwrap();
        assert_eq!(sample_rate, 16000);
        assert_eq!(samples, vec![0.0; 12345]);
    }

    #[test]
    fn test_normalize_mode_preserves_rate() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        let out = dir.path().join("out");
        let samples: Vec<f32> = (0..8000)
            .map(|i| 0.02 * (2.0 * std::f32::consts::PI * 300.0 * i as f32 / 8000.0).sin())
            .collect();
        wavprep::io::save_wav(
            data.join("n/q.wav"),
            &AudioBuffer::new(samples, 8000),
            WavEncoding::Float32,
        )
        .unwrap();

        run_mode(Mode::Normalize, &data, &out, &native_config())
            .unwrap()
            .ensure_success()
            .unwrap();

        let (normalized, sample_rate, _) = load_wav(&out.join("n/q.wav")).unwrap();
        assert_eq!(sample_rate, 8000);
        assert!((rms(&normalized) - 0.1).abs() < 1e-3);
    }

    #[test]
    fn test_transcoder_failure_is_reported_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        let out = dir.path().join("out");
        std::fs::create_dir_all(data.join("a")).unwrap();
        std::fs::write(data.join("a/x.mp3"), b"not really mp3").unwrap();
        std::fs::write(data.join("b.mp3"), b"not really mp3").unwrap();

        let mut config = PipelineConfig {
            quiet: true,
            ..Default::default()
        };
        config.transcode.ffmpeg_program = "wavprep-missing-ffmpeg".to_string();

        let report = run_mode(Mode::All, &data, &out, &config).unwrap();

        assert_eq!(report.stages[0].files.len(), 2);
        assert_eq!(report.failed(), 2);
        assert!(report.stages[1].files.is_empty());
        assert!(report.stages[2].files.is_empty());
        assert!(report
            .failures()
            .all(|f| f.error.as_deref().unwrap_or("").contains("wavprep-missing-ffmpeg")));
        match report.ensure_success() {
            Err(PipelineError::FilesFailed { stage, failed, total }) => {
                assert_eq!(stage, "convert");
                assert_eq!((failed, total), (2, 2));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_failed_convert_is_not_trimmed_or_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        let out = dir.path().join("out");
        std::fs::create_dir_all(data.join("a")).unwrap();
        std::fs::write(data.join("a/x.mp3"), b"not really mp3").unwrap();
        // left behind by an earlier run
        write_source(&out.join("wav16/a/x.wav"), 16000, 0.3);

        let mut config = PipelineConfig {
            quiet: true,
            ..Default::default()
        };
        config.transcode.ffmpeg_program = "false".to_string();

        let report = run_mode(Mode::All, &data, &out, &config).unwrap();

        assert_eq!(report.stages[0].failed(), 1);
        assert!(report.stages[1].files.is_empty());
        assert!(report.stages[2].files.is_empty());
        assert!(!out.join("wav16/a/x.wav").exists());
        assert!(!out.join("trimmed/a/x.wav").exists());
        assert!(!out.join("normalized/a/x.wav").exists());
        assert!(report.ensure_success().is_err());
    }

    #[test]
    fn test_all_mode_skips_only_failed_files() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        let out = dir.path().join("out");
        write_source(&data.join("good.wav"), 16000, 0.2);
        std::fs::write(data.join("broken.wav"), b"RIFF garbage").unwrap();
        write_source(&out.join("wav16/broken.wav"), 16000, 0.2);

        let report = run_mode(Mode::All, &data, &out, &native_config()).unwrap();

        assert_eq!(report.failed(), 1);
        assert_eq!(report.stages[1].files.len(), 1);
        assert_eq!(report.stages[2].files.len(), 1);
        assert_eq!(
            relative_files(&out.join("normalized")),
            vec![PathBuf::from("good.wav")]
        );
    }

    #[test]
    fn test_native_convert_isolates_corrupt_source() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        let out = dir.path().join("out");
        write_source(&data.join("good.wav"), 16000, 0.2);
        std::fs::write(data.join("broken.wav"), b"RIFF garbage").unwrap();

        let report = run_mode(Mode::Convert, &data, &out, &native_config()).unwrap();

        assert_eq!(report.failed(), 1);
        assert!(out.join("good.wav").is_file());
        let failed = report.failures().next().unwrap();
        assert!(failed.input.ends_with("broken.wav"));
    }

    #[test]
    fn test_ffmpeg_convert_mp3() {
        if !ffmpeg_available() {
            eprintln!("ffmpeg not found, skipping");
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        let out = dir.path().join("out");
        let wav = dir.path().join("src.wav");
        write_source(&wav, 44100, 0.3);
        std::fs::create_dir_all(data.join("a")).unwrap();
        let encoded = std::process::Command::new("ffmpeg")
            .args(["-y", "-loglevel", "error", "-i"])
            .arg(&wav)
            .arg(data.join("a/x.mp3"))
            .status()
            .map(|s| s.success())
            .unwrap_or(false);
        if !encoded {
            eprintln!("ffmpeg cannot encode mp3 here, skipping");
            return;
        }

        let config = PipelineConfig {
            quiet: true,
            ..Default::default()
        };
        let report = run_mode(Mode::All, &data, &out, &config).unwrap();
        assert!(report.ensure_success().is_ok(), "{:?}", report);

        for stage in ["wav16", "trimmed", "normalized"] {
            let (_, sample_rate, channels) = load_wav(&out.join(stage).join("a/x.wav")).unwrap();
            assert_eq!((sample_rate, channels), (16000, 1), "{}", stage);
        }
    }

    #[test]
    fn test_cli_logs_stage_error_and_fails() {
        let dir = tempfile::tempdir().unwrap();
        let output = std::process::Command::new(env!("CARGO_BIN_EXE_wavprep"))
            .arg("trim")
            .arg("--data_root")
            .arg(dir.path().join("missing"))
            .arg("--out_root")
            .arg(dir.path().join("out"))
            .env("RUST_LOG", "error")
            .output()
            .unwrap();

        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("ERROR"), "stderr: {}", stderr);
        assert!(stderr.contains("missing"), "stderr: {}", stderr);
    }
}
