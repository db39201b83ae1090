//! # Reference Note Table Module
//!
//! The table of notes the detector can recognise. Each note owns one or more
//! harmonic frequencies; matching always measures the distance to the nearest
//! of them, so octave-adjacent harmonics are equally eligible.
//!
//! ## Features
//! - Validated, ordered note table (table order breaks matching ties)
//! - CSV loading with any number of harmonic columns
//! - Built-in standard guitar tuning table

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A note label with its characteristic frequencies in Hz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEntry {
    pub label: String,
    pub harmonics: Vec<f64>,
}

impl NoteEntry {
    pub fn new(label: impl Into<String>, harmonics: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            harmonics,
        }
    }
}

/// An ordered, non-empty set of notes with unique labels.
///
/// Read-only once built. Every entry has at least one finite, positive harmonic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<NoteEntry>", into = "Vec<NoteEntry>")]
pub struct NoteTable {
    entries: Vec<NoteEntry>,
}

/// Six-string guitar in standard tuning: fundamental and 2nd harmonic per string.
static STANDARD_GUITAR: Lazy<NoteTable> = Lazy::new(|| NoteTable {
    entries: vec![
        NoteEntry::new("E2", vec![82.41, 164.81]),
        NoteEntry::new("A2", vec![110.00, 220.00]),
        NoteEntry::new("D3", vec![146.83, 293.66]),
        NoteEntry::new("G3", vec![196.00, 392.00]),
        NoteEntry::new("B3", vec![246.94, 493.88]),
        NoteEntry::new("E4", vec![329.63, 659.26]),
    ],
});

impl NoteTable {
    /// Builds a table, checking every invariant.
    ///
    /// # Returns
    /// * `Err(ConfigError::EmptyTable)` - No entries
    /// * `Err(ConfigError::DuplicateNote)` - A label appears twice
    /// * `Err(ConfigError::NoHarmonics)` - An entry without harmonics
    /// * `Err(ConfigError::InvalidHarmonic)` - A non-finite or non-positive harmonic
    pub fn new(entries: Vec<NoteEntry>) -> Result<Self, ConfigError> {
        let table = Self { entries };
        table.validate()?;
        Ok(table)
    }

    /// The built-in six-string guitar table (E2 A2 D3 G3 B3 E4).
    pub fn standard_guitar() -> Self {
        STANDARD_GUITAR.clone()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entries.is_empty() {
            return Err(ConfigError::EmptyTable);
        }
        let mut seen = HashSet::new();
        for entry in &self.entries {
            if !seen.insert(entry.label.as_str()) {
                return Err(ConfigError::DuplicateNote {
                    note: entry.label.clone(),
                });
            }
            if entry.harmonics.is_empty() {
                return Err(ConfigError::NoHarmonics {
                    note: entry.label.clone(),
                });
            }
            if let Some(bad) = entry.harmonics.iter().find(|h| !(h.is_finite() && **h > 0.0)) {
                return Err(ConfigError::InvalidHarmonic {
                    note: entry.label.clone(),
                    value: bad.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn entries(&self) -> &[NoteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds an entry by its exact label.
    pub fn get(&self, label: &str) -> Option<&NoteEntry> {
        self.entries.iter().find(|entry| entry.label == label)
    }

    /// Loads a table from a CSV file. See [`NoteTable::from_csv_reader`].
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Parses a CSV note table.
    ///
    /// The header must contain a `Note` column (case-insensitive). Every other
    /// column holds a harmonic frequency, taken in column order. Blank cells
    /// are skipped, so rows may carry different numbers of harmonics.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let note_column = headers
            .iter()
            .position(is_note_header)
            .ok_or(ConfigError::MissingNoteColumn)?;
        if headers.len() < 2 {
            return Err(ConfigError::NoHarmonicColumns);
        }

        let mut entries = Vec::new();
        for (row, record) in csv_reader.records().enumerate() {
            let record = record?;
            let label = record.get(note_column).unwrap_or_default();
            if label.is_empty() {
                return Err(ConfigError::EmptyLabel { row: row + 1 });
            }

            let mut harmonics = Vec::new();
            for (column, cell) in record.iter().enumerate() {
                if column == note_column || cell.is_empty() {
                    continue;
                }
                let value = cell.parse::<f64>().map_err(|_| ConfigError::InvalidHarmonic {
                    note: label.to_string(),
                    value: cell.to_string(),
                })?;
                harmonics.push(value);
            }
            entries.push(NoteEntry::new(label, harmonics));
        }

        Self::new(entries)
    }
}

fn is_note_header(header: &str) -> bool {
    header.eq_ignore_ascii_case("note") || header.eq_ignore_ascii_case("nota")
}

impl TryFrom<Vec<NoteEntry>> for NoteTable {
    type Error = ConfigError;

    fn try_from(entries: Vec<NoteEntry>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<NoteTable> for Vec<NoteEntry> {
    fn from(table: NoteTable) -> Self {
        table.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTES_CSV: &str = "\
Note,1st Harmonic (Hz),2nd Harmonic (Hz)
E2,82.41,164.81
A2,110.00,220.00
D3,146.83,293.66
";

    #[test]
    fn parses_two_harmonic_table_in_order() {
        let table = NoteTable::from_csv_reader(NOTES_CSV.as_bytes()).unwrap();
        let labels: Vec<&str> = table.entries().iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["E2", "A2", "D3"]);
        assert_eq!(table.get("A2").unwrap().harmonics, vec![110.0, 220.0]);
    }

    #[test]
    fn accepts_single_harmonic_column_and_blank_cells() {
        let single = "Note,1st Harmonic (Hz)\nA4,440\n";
        let table = NoteTable::from_csv_reader(single.as_bytes()).unwrap();
        assert_eq!(table.get("A4").unwrap().harmonics, vec![440.0]);

        let ragged = "Note,1st,2nd,3rd\nA2,110,,330\nA3,220,440,\n";
        let table = NoteTable::from_csv_reader(ragged.as_bytes()).unwrap();
        assert_eq!(table.get("A2").unwrap().harmonics, vec![110.0, 330.0]);
        assert_eq!(table.get("A3").unwrap().harmonics, vec![220.0, 440.0]);
    }

    #[test]
    fn note_column_need_not_come_first() {
        let csv = "2nd Harmonic (Hz),note,1st Harmonic (Hz)\n220,A2,110\n";
        let table = NoteTable::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.get("A2").unwrap().harmonics, vec![220.0, 110.0]);
    }

    #[test]
    fn malformed_tables_are_configuration_errors() {
        let header_only = "Note,1st Harmonic (Hz)\n";
        assert!(matches!(
            NoteTable::from_csv_reader(header_only.as_bytes()),
            Err(ConfigError::EmptyTable)
        ));

        let no_note = "Name,1st\nA2,110\n";
        assert!(matches!(
            NoteTable::from_csv_reader(no_note.as_bytes()),
            Err(ConfigError::MissingNoteColumn)
        ));

        let only_note = "Note\nA2\n";
        assert!(matches!(
            NoteTable::from_csv_reader(only_note.as_bytes()),
            Err(ConfigError::NoHarmonicColumns)
        ));

        let not_a_number = "Note,1st\nA2,abc\n";
        assert!(matches!(
            NoteTable::from_csv_reader(not_a_number.as_bytes()),
            Err(ConfigError::InvalidHarmonic { .. })
        ));

        let empty_row = "Note,1st,2nd\nA2,,\n";
        assert!(matches!(
            NoteTable::from_csv_reader(empty_row.as_bytes()),
            Err(ConfigError::NoHarmonics { .. })
        ));

        let duplicate = "Note,1st\nA2,110\nA2,111\n";
        assert!(matches!(
            NoteTable::from_csv_reader(duplicate.as_bytes()),
            Err(ConfigError::DuplicateNote { .. })
        ));
    }

    #[test]
    fn rejects_non_positive_harmonics() {
        let result = NoteTable::new(vec![NoteEntry::new("X", vec![0.0])]);
        assert!(matches!(result, Err(ConfigError::InvalidHarmonic { .. })));
    }

    #[test]
    fn standard_guitar_table_is_valid() {
        let table = NoteTable::standard_guitar();
        assert!(table.validate().is_ok());
        assert_eq!(table.len(), 6);
        assert_eq!(table.entries()[0].label, "E2");
    }

    #[test]
    fn deserializing_validates_the_table() {
        let json = r#"[{"label":"A4","harmonics":[440.0]}]"#;
        let ok: NoteTable = serde_json::from_str(json).unwrap();
        assert_eq!(ok.len(), 1);
        assert!(serde_json::from_str::<NoteTable>("[]").is_err());
    }
}
