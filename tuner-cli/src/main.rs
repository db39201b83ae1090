//! # String Tuner - Batch Command Line Front-End
//!
//! Loads a directory of WAV recordings and a reference note table, runs the
//! `tuner-core` pipeline over every file and prints the result table.
//!
//! ## Usage
//! ```text
//! tuner-cli ./recordings --notes notes.csv --format csv
//! ```
//! Without `--notes` the built-in standard guitar table is used. Flags
//! override values read from `--config`.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use tuner_core::{AnalysisConfig, BatchItem, NoteTable, ResultTable, audio, process_batch};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Identify the note of each recorded string and check its tuning"
)]
struct Args {
    /// Directory containing the `.wav` recordings
    audio_dir: PathBuf,

    /// CSV note table (`Note` column plus one or more harmonic columns)
    #[arg(short, long)]
    notes: Option<PathBuf>,

    /// JSON file with analysis parameters
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Treat every file as recorded at this rate instead of its header rate
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Tuning tolerance in Hz
    #[arg(long)]
    tolerance: Option<f64>,

    /// Peak filter threshold as a fraction of the strongest bin
    #[arg(long)]
    threshold: Option<f64>,

    /// Number of files analysed in parallel
    #[arg(short, long)]
    workers: Option<usize>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Log every pipeline stage
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Csv,
    Json,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = build_config(&args)?;
    config.validate().context("invalid analysis parameters")?;

    let table = match &args.notes {
        Some(path) => NoteTable::from_csv_path(path)
            .with_context(|| format!("failed to load note table {}", path.display()))?,
        None => {
            info!("no note table given, using standard guitar tuning");
            NoteTable::standard_guitar()
        }
    };
    info!("loaded {} reference note(s)", table.len());

    let files = audio::discover_wav_files(&args.audio_dir)
        .with_context(|| format!("failed to list {}", args.audio_dir.display()))?;
    if files.is_empty() {
        warn!("no .wav files found in {}", args.audio_dir.display());
    }

    let items = files.iter().map(|path| load_item(path)).collect();

    let result = process_batch(items, &table, &config)?;
    print_result(&result, args.format)
}

/// Starts from the JSON config (or defaults) and applies command line overrides.
fn build_config(args: &Args) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(rate) = args.sample_rate {
        config.sample_rate_override = Some(rate);
    }
    if let Some(tolerance) = args.tolerance {
        config.tolerance_hz = tolerance;
    }
    if let Some(threshold) = args.threshold {
        config.threshold_ratio = threshold;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    debug!("analysis config: {:?}", config);
    Ok(config)
}

/// Loads analysis parameters from a JSON file. Missing fields keep their defaults.
fn load_config(path: &Path) -> Result<AnalysisConfig> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let config: AnalysisConfig = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(config)
}

/// Decodes one file. Decoding failures become failed batch items.
fn load_item(path: &Path) -> BatchItem {
    let id = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    match audio::load_wav(path) {
        Ok(buffer) => BatchItem::new(id, buffer),
        Err(err) => BatchItem::failed(id, err),
    }
}

fn print_result(result: &ResultTable, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => print!("{}", result),
        OutputFormat::Csv => result
            .write_csv(io::stdout().lock())
            .context("failed to write CSV output")?,
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(result).context("failed to serialise results")?;
            println!("{}", json);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = Args::parse_from([
            "tuner-cli",
            "recordings",
            "--tolerance",
            "2.5",
            "--threshold",
            "0.2",
            "--workers",
            "4",
            "--sample-rate",
            "44100",
        ]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.tolerance_hz, 2.5);
        assert_eq!(config.threshold_ratio, 0.2);
        assert_eq!(config.workers, 4);
        assert_eq!(config.sample_rate_override, Some(44_100));
        assert_eq!(args.format, OutputFormat::Table);
    }

    #[test]
    fn unreadable_file_becomes_failed_item() {
        let item = load_item(Path::new("/nonexistent/recording.wav"));
        assert_eq!(item.id, "recording.wav");
        assert!(item.buffer.is_err());
    }
}
