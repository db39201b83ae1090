// tuner-core/src/lib.rs

//! The core logic for the string tuner.
//! This crate turns recorded samples into a dominant frequency, matches it
//! against a reference table of note harmonics and decides whether the
//! string is in tune. It is completely headless and performs no printing.

pub mod audio;
pub mod config;
pub mod error;
pub mod fft;
pub mod notes;
pub mod pipeline;
pub mod pitch;
pub mod tuning;

pub use audio::SampleBuffer;
pub use config::AnalysisConfig;
pub use error::{AudioError, ConfigError, InputError, ItemFailure};
pub use notes::{NoteEntry, NoteTable};
pub use pipeline::{
    BatchItem, MatchResult, ResultRow, ResultTable, RowOutcome, analyze_buffer, process_batch,
};
pub use tuning::TuningStatus;
