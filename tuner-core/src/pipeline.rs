//! # Pipeline Module
//!
//! Runs the full analysis over a batch of audio samples:
//! transform, filter, match, evaluate, then append a row to the result table.
//!
//! Every item is independent. A failing item becomes an error row and the
//! rest of the batch carries on. Only an unusable note table or configuration
//! stops the run, and that is checked before any item is touched.
//!
//! With `workers > 1` the items are spread over a pool of scoped threads fed
//! by a `crossbeam-channel` queue. Rows are put back in input order before
//! the table is returned.

use std::fmt;
use std::io::Write;
use std::thread;

use log::{debug, info, warn};
use serde::Serialize;

use crate::audio::SampleBuffer;
use crate::config::AnalysisConfig;
use crate::error::{ConfigError, InputError, ItemFailure};
use crate::fft;
use crate::notes::NoteTable;
use crate::pitch;
use crate::tuning::{self, TuningStatus};

/// Label written in place of a note for rows that could not be analysed.
pub const UNDETERMINED_NOTE: &str = "undetermined";

/// Status written for rows that could not be analysed.
pub const ERROR_STATUS: &str = "error";

/// The analysis of one sample buffer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub note: String,
    pub dominant_frequency: f64,
    pub nearest_harmonic: f64,
    /// `dominant_frequency - nearest_harmonic`, in Hz.
    pub deviation: f64,
    /// `None` when the dominant frequency is 0 Hz (DC), where cents are undefined.
    pub cents_deviation: Option<f64>,
    pub status: TuningStatus,
}

/// One input of a batch: an identifier and its decoded samples.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub id: String,
    pub buffer: Result<SampleBuffer, ItemFailure>,
}

impl BatchItem {
    pub fn new(id: impl Into<String>, buffer: SampleBuffer) -> Self {
        Self {
            id: id.into(),
            buffer: Ok(buffer),
        }
    }

    /// An item whose audio could not even be loaded.
    pub fn failed(id: impl Into<String>, failure: impl Into<ItemFailure>) -> Self {
        Self {
            id: id.into(),
            buffer: Err(failure.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOutcome {
    Matched(MatchResult),
    Failed(ItemFailure),
}

/// A single line of the result table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub file: String,
    pub outcome: RowOutcome,
}

impl ResultRow {
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, RowOutcome::Failed(_))
    }

    pub fn note(&self) -> &str {
        match &self.outcome {
            RowOutcome::Matched(result) => &result.note,
            RowOutcome::Failed(_) => UNDETERMINED_NOTE,
        }
    }

    /// Dominant frequency rounded to two decimals.
    pub fn rounded_frequency(&self) -> Option<f64> {
        match &self.outcome {
            RowOutcome::Matched(result) => {
                Some((result.dominant_frequency * 100.0).round() / 100.0)
            }
            RowOutcome::Failed(_) => None,
        }
    }

    pub fn status_label(&self) -> String {
        match &self.outcome {
            RowOutcome::Matched(result) => result.status.to_string(),
            RowOutcome::Failed(_) => ERROR_STATUS.to_string(),
        }
    }

    fn frequency_cell(&self) -> String {
        self.rounded_frequency()
            .map(|freq| format!("{:.2}", freq))
            .unwrap_or_default()
    }
}

/// Per-file results, in the order the files were given.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultTable {
    pub rows: Vec<ResultRow>,
}

const HEADERS: [&str; 4] = ["File", "Note", "Dominant Frequency (Hz)", "Status"];

impl ResultTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ResultRow> {
        self.rows.iter().filter(|row| row.is_failure())
    }

    /// Writes the table as CSV with a header line.
    ///
    /// Failed rows carry `undetermined`, an empty frequency and `error`.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(HEADERS)?;
        for row in &self.rows {
            csv_writer.write_record([
                row.file.as_str(),
                row.note(),
                row.frequency_cell().as_str(),
                row.status_label().as_str(),
            ])?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

impl fmt::Display for ResultTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<[String; 4]> = self
            .rows
            .iter()
            .map(|row| {
                [
                    row.file.clone(),
                    row.note().to_string(),
                    row.frequency_cell(),
                    row.status_label(),
                ]
            })
            .collect();

        let mut widths = HEADERS.map(str::len);
        for line in &cells {
            for (width, cell) in widths.iter_mut().zip(line) {
                *width = (*width).max(cell.chars().count());
            }
        }

        writeln!(
            f,
            "{:<w0$}  {:<w1$}  {:>w2$}  {}",
            HEADERS[0],
            HEADERS[1],
            HEADERS[2],
            HEADERS[3],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2]
        )?;
        for [file, note, freq, status] in &cells {
            writeln!(
                f,
                "{:<w0$}  {:<w1$}  {:>w2$}  {}",
                file,
                note,
                freq,
                status,
                w0 = widths[0],
                w1 = widths[1],
                w2 = widths[2]
            )?;
        }
        Ok(())
    }
}

/// Performs a full analysis on one sample buffer.
///
/// This function processes the buffer through the complete pipeline:
/// 1. Computes the magnitude spectrum
/// 2. Filters it against `config.threshold_ratio` and takes the dominant frequency
/// 3. Matches the dominant frequency against the note table
/// 4. Evaluates the tuning against the matched note's harmonics
///
/// # Returns
/// * `Ok(result)` - Note, dominant frequency, deviation and tuning status
/// * `Err(InputError)` - Empty, degenerate or silent buffer
pub fn analyze_buffer(
    buffer: &SampleBuffer,
    table: &NoteTable,
    config: &AnalysisConfig,
) -> Result<MatchResult, InputError> {
    let spectrum = fft::compute_spectrum(buffer)?;
    let peaks = pitch::filter_peaks(&spectrum, config.threshold_ratio)?;
    let frequency = peaks.dominant_frequency;
    debug!(
        "{} of {} bins above threshold {:.4}, dominant {:.2} Hz",
        peaks.frequencies.len(),
        spectrum.len(),
        peaks.threshold,
        frequency
    );

    let entry = tuning::match_note(frequency, table).ok_or(InputError::Unmatched { frequency })?;
    let verdict = tuning::evaluate_tuning(frequency, &entry.harmonics, config.tolerance_hz)
        .ok_or(InputError::Unmatched { frequency })?;

    Ok(MatchResult {
        note: entry.label.clone(),
        dominant_frequency: frequency,
        nearest_harmonic: verdict.nearest_harmonic,
        deviation: verdict.deviation,
        cents_deviation: (frequency > 0.0)
            .then(|| tuning::calculate_cents_deviation(frequency, verdict.nearest_harmonic)),
        status: verdict.status,
    })
}

/// Analyses every item of a batch and collects the result table.
///
/// # Arguments
/// * `items` - Identifiers and their samples, in output order
/// * `table` - Reference note table, shared read-only by every item
/// * `config` - Analysis parameters
///
/// # Returns
/// * `Ok(table)` - One row per item, in input order; failed items are error rows
/// * `Err(ConfigError)` - Invalid table or parameters; nothing was processed
pub fn process_batch(
    items: Vec<BatchItem>,
    table: &NoteTable,
    config: &AnalysisConfig,
) -> Result<ResultTable, ConfigError> {
    config.validate()?;
    table.validate()?;

    let rows = if config.workers > 1 && items.len() > 1 {
        process_parallel(items, table, config)
    } else {
        items
            .into_iter()
            .map(|item| process_item(item, table, config))
            .collect()
    };

    let result = ResultTable { rows };
    info!(
        "processed {} file(s), {} failed",
        result.len(),
        result.failures().count()
    );
    Ok(result)
}

fn process_item(item: BatchItem, table: &NoteTable, config: &AnalysisConfig) -> ResultRow {
    let outcome = item.buffer.and_then(|mut buffer| {
        if let Some(rate) = config.sample_rate_override {
            buffer.sample_rate = rate;
        }
        analyze_buffer(&buffer, table, config).map_err(ItemFailure::from)
    });

    let outcome = match outcome {
        Ok(result) => {
            debug!(
                "{}: {} at {:.2} Hz, {}",
                item.id, result.note, result.dominant_frequency, result.status
            );
            RowOutcome::Matched(result)
        }
        Err(failure) => {
            warn!("{}: {}", item.id, failure);
            RowOutcome::Failed(failure)
        }
    };

    ResultRow {
        file: item.id,
        outcome,
    }
}

/// Spreads the items over `config.workers` scoped threads.
fn process_parallel(
    items: Vec<BatchItem>,
    table: &NoteTable,
    config: &AnalysisConfig,
) -> Vec<ResultRow> {
    let workers = config.workers.min(items.len());
    let (job_tx, job_rx) = crossbeam_channel::unbounded::<(usize, BatchItem)>();
    let (row_tx, row_rx) = crossbeam_channel::unbounded::<(usize, ResultRow)>();

    for job in items.into_iter().enumerate() {
        // The receiver is still held here, so an unbounded send cannot fail.
        let _ = job_tx.send(job);
    }
    drop(job_tx);

    debug!("starting {} analysis workers", workers);
    thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let row_tx = row_tx.clone();
            scope.spawn(move || {
                for (index, item) in job_rx.iter() {
                    if row_tx.send((index, process_item(item, table, config))).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(row_tx);

    let mut indexed: Vec<(usize, ResultRow)> = row_rx.iter().collect();
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, row)| row).collect()
}
