//! # Error Module
//!
//! Error types shared by every stage of the analysis pipeline.
//!
//! Failures fall into two families:
//! - [`InputError`] - a single sample buffer cannot be analysed (empty, silent, ...).
//!   Inside a batch this only fails the one row that produced it.
//! - [`ConfigError`] - the note table or the analysis parameters are unusable.
//!   Nothing can be processed without them, so the whole run stops.

use serde::Serialize;
use thiserror::Error;

/// A sample buffer that cannot be turned into a dominant frequency.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputError {
    #[error("sample buffer is empty")]
    EmptyBuffer,

    #[error("sample rate must be greater than zero")]
    ZeroSampleRate,

    #[error("sample {index} is not a finite number")]
    NonFiniteSample { index: usize },

    /// Every spectral bin has zero magnitude, so no peak survives the filter.
    #[error("signal is silent, no spectral peak above the threshold")]
    Silence,

    /// Only reachable with a note table that bypassed validation.
    #[error("no reference note to compare {frequency} Hz against")]
    Unmatched { frequency: f64 },

    /// The transform produced magnitudes that are not finite numbers.
    #[error("spectrum is not usable: {reason}")]
    InvalidSpectrum { reason: String },
}

/// Fatal problems with the reference note table or the analysis parameters.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reference note table is empty")]
    EmptyTable,

    #[error("reference note table has no `Note` column")]
    MissingNoteColumn,

    #[error("reference note table has no harmonic columns")]
    NoHarmonicColumns,

    #[error("row {row} of the note table has an empty note label")]
    EmptyLabel { row: usize },

    #[error("note `{note}` has no harmonic frequencies")]
    NoHarmonics { note: String },

    #[error("note `{note}` appears more than once")]
    DuplicateNote { note: String },

    #[error("note `{note}` has an invalid harmonic value `{value}`")]
    InvalidHarmonic { note: String, value: String },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("failed to parse note table: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read note table: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while decoding a waveform file.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to read WAV file: {0}")]
    Wav(#[from] hound::Error),

    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),
}

/// Why a single row of a batch could not be analysed.
///
/// Stored in the result table in place of a match; never propagated further.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemFailure {
    #[error(transparent)]
    InvalidInput(#[from] InputError),

    /// The audio source could not be decoded at all.
    #[error("unreadable audio: {0}")]
    Unreadable(String),
}

impl From<AudioError> for ItemFailure {
    fn from(err: AudioError) -> Self {
        ItemFailure::Unreadable(err.to_string())
    }
}
