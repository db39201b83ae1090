//! # Musical Tuning Module
//!
//! Maps a dominant frequency to a note of the reference table and decides
//! whether the string producing it is in tune.
//!
//! ## Features
//! - Nearest-harmonic note matching over any number of harmonics per note
//! - Three-way tuning verdict with a tolerance in Hz
//! - Cent deviation calculation
//!
//! Both matching and evaluation use the same rule: the distance from a
//! frequency to a note is the distance to the closest of its harmonics, and
//! ties go to whatever comes first (table order, then harmonic order).

use std::fmt;

use serde::Serialize;

use crate::notes::{NoteEntry, NoteTable};

/// Classification of a string's pitch relative to its nearest harmonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TuningStatus {
    InTune,
    /// Pitch is above the harmonic: loosen the string.
    TooSharp,
    /// Pitch is below the harmonic: tighten the string.
    TooFlat,
}

impl TuningStatus {
    /// What to do with the string.
    pub fn advice(&self) -> &'static str {
        match self {
            TuningStatus::InTune => "in tune",
            TuningStatus::TooSharp => "loosen the string",
            TuningStatus::TooFlat => "tighten the string",
        }
    }
}

impl fmt::Display for TuningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TuningStatus::InTune => "in tune",
            TuningStatus::TooSharp => "too sharp",
            TuningStatus::TooFlat => "too flat",
        };
        f.write_str(label)
    }
}

/// Outcome of comparing a frequency with one note's harmonics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TuningVerdict {
    pub nearest_harmonic: f64,
    /// `dominant - nearest_harmonic`, in Hz.
    pub deviation: f64,
    pub status: TuningStatus,
}

/// Returns the harmonic closest to `freq` and its absolute distance.
///
/// The first harmonic wins a tie. `None` only for an empty slice.
pub fn nearest_harmonic(freq: f64, harmonics: &[f64]) -> Option<(f64, f64)> {
    let mut best: Option<(f64, f64)> = None;
    for &harmonic in harmonics {
        let distance = (freq - harmonic).abs();
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((harmonic, distance));
        }
    }
    best
}

/// Finds the table entry whose nearest harmonic is closest to `freq`.
///
/// This function searches every note of the table. A tie goes to the note
/// that appears first. The search never fails for a non-empty table: every
/// frequency matches some note, however far away.
///
/// # Arguments
/// * `freq` - Dominant frequency in Hz
/// * `table` - Reference note table
///
/// # Returns
/// * `Some(entry)` - The closest note
/// * `None` - Only when the table is empty
pub fn match_note(freq: f64, table: &NoteTable) -> Option<&NoteEntry> {
    let mut best: Option<(&NoteEntry, f64)> = None;
    for entry in table.entries() {
        let Some((_, distance)) = nearest_harmonic(freq, &entry.harmonics) else {
            continue;
        };
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((entry, distance));
        }
    }
    best.map(|(entry, _)| entry)
}

/// Compares a frequency with a note's harmonics.
///
/// # Arguments
/// * `freq` - Dominant frequency in Hz
/// * `harmonics` - Harmonic frequencies of the matched note
/// * `tolerance_hz` - Largest absolute deviation still considered in tune
///
/// # Returns
/// * `Some(verdict)` - `|deviation| <= tolerance` is in tune, above is too
///   sharp, below is too flat
/// * `None` - `harmonics` is empty
pub fn evaluate_tuning(
    freq: f64,
    harmonics: &[f64],
    tolerance_hz: f64,
) -> Option<TuningVerdict> {
    let (nearest, _) = nearest_harmonic(freq, harmonics)?;
    let deviation = freq - nearest;

    let status = if deviation.abs() <= tolerance_hz {
        TuningStatus::InTune
    } else if deviation > tolerance_hz {
        TuningStatus::TooSharp
    } else {
        TuningStatus::TooFlat
    };

    Some(TuningVerdict {
        nearest_harmonic: nearest,
        deviation,
        status,
    })
}

/// Calculates the deviation from a target frequency in cents.
///
/// Cents are a logarithmic unit of pitch measurement where:
/// - 100 cents = 1 semitone
/// - 1200 cents = 1 octave
/// - Positive values indicate sharpness, negative values indicate flatness
pub fn calculate_cents_deviation(freq: f64, target_freq: f64) -> f64 {
    1200.0 * (freq / target_freq).log2()
}
