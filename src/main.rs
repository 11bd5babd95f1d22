//! Command-line entry point
//!
//! Usage:
//!   wavprep <convert|trim|normalize|all> --data_root <DIR> --out_root <DIR> [OPTIONS]
//!
//! Logging goes to stderr through env_logger (`RUST_LOG=debug` for per-file
//! detail). With `--json`, one JSON object per processed file is printed on
//! stdout.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use wavprep::{
    run_mode, BatchReport, ClipPolicy, Mode, PipelineConfig, Stage, TranscoderKind, WavEncoding,
};

/// Pipeline action
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Action {
    /// Transcode source files to mono WAV
    Convert,
    /// Trim silence from WAV files
    Trim,
    /// Normalize WAV files to a target RMS level
    Normalize,
    /// Convert, trim and normalize into wav16/, trimmed/, normalized/
    All,
}

impl From<Action> for Mode {
    fn from(action: Action) -> Self {
        match action {
            Action::Convert => Mode::Convert,
            Action::Trim => Mode::Trim,
            Action::Normalize => Mode::Normalize,
            Action::All => Mode::All,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Backend {
    Ffmpeg,
    Native,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Encoding {
    Pcm16,
    Float32,
}

/// Batch audio preprocessing: transcode, trim silence, normalize loudness
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// What to run
    #[arg(value_enum)]
    action: Action,

    /// Directory with the input audio files
    #[arg(long = "data_root", alias = "data-root")]
    data_root: PathBuf,

    /// Directory where results are written
    #[arg(long = "out_root", alias = "out-root")]
    out_root: PathBuf,

    /// Output sample rate of the convert stage in Hz [default: 16000]
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Silence threshold in dB below the loudest frame [default: 30]
    #[arg(long, allow_negative_numbers = true)]
    top_db: Option<f32>,

    /// Target RMS level in dBFS [default: -20]
    #[arg(long, allow_negative_numbers = true)]
    target_db: Option<f32>,

    /// Transcoding backend [default: ffmpeg]
    #[arg(long, value_enum)]
    transcoder: Option<Backend>,

    /// ffmpeg executable [default: ffmpeg]
    #[arg(long)]
    ffmpeg: Option<String>,

    /// Extension of source files for convert [default: mp3]
    #[arg(long)]
    source_ext: Option<String>,

    /// Sample encoding of written WAV files [default: pcm16]
    #[arg(long, value_enum)]
    encoding: Option<Encoding>,

    /// Do not clamp normalized samples to [-1, 1]
    #[arg(long)]
    no_clamp: bool,

    /// Hide progress bars
    #[arg(long)]
    no_progress: bool,

    /// Print one JSON object per processed file on stdout
    #[arg(long)]
    json: bool,
}

impl Args {
    /// Defaults overridden by whatever flags were given
    fn config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::default();

        if let Some(rate) = self.sample_rate {
            config.transcode.sample_rate = rate;
        }
        if let Some(backend) = self.transcoder {
            config.transcode.backend = match backend {
                Backend::Ffmpeg => TranscoderKind::Ffmpeg,
                Backend::Native => TranscoderKind::Native,
            };
        }
        if let Some(program) = &self.ffmpeg {
            config.transcode.ffmpeg_program = program.clone();
        }
        if let Some(ext) = &self.source_ext {
            config.transcode.source_extension = ext.clone();
        }
        if let Some(top_db) = self.top_db {
            config.silence.top_db = top_db;
        }
        if let Some(target_db) = self.target_db {
            config.normalization.target_db = target_db;
        }
        if self.no_clamp {
            config.normalization.clip = ClipPolicy::Allow;
        }
        if let Some(encoding) = self.encoding {
            config.encoding = match encoding {
                Encoding::Pcm16 => WavEncoding::Pcm16,
                Encoding::Float32 => WavEncoding::Float32,
            };
        }
        config.quiet = self.no_progress || self.json;

        config
    }
}

fn print_jsonl(report: &BatchReport) {
    for record in report.stages.iter().flat_map(|s| s.files.iter()) {
        match serde_json::to_string(record) {
            Ok(line) => println!("{}", line),
            Err(e) => log::error!("Failed to serialize record for {}: {}", record.input.display(), e),
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.config();
    let mode = Mode::from(args.action);

    log::debug!("Running {} with {:?}", mode, config);

    let report = match run_mode(mode, &args.data_root, &args.out_root, &config) {
        Ok(report) => report,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        print_jsonl(&report);
    }

    if matches!(mode, Mode::All) {
        let final_dir = args.out_root.join(Stage::Normalize.subdir());
        if args.json {
            eprintln!("Pipeline complete. Final directory: {}", final_dir.display());
        } else {
            println!("Pipeline complete. Final directory: {}", final_dir.display());
        }
    }

    if let Err(e) = report.ensure_success() {
        for failure in report.failures() {
            log::error!(
                "{} {}: {}",
                failure.stage,
                failure.input.display(),
                failure.error.as_deref().unwrap_or("unknown error")
            );
        }
        log::error!("{}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
