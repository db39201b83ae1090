use std::f64::consts::PI;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use tuner_core::audio::{discover_wav_files, load_wav};
use tuner_core::{AnalysisConfig, BatchItem, NoteTable, RowOutcome, TuningStatus, process_batch};

const SAMPLE_RATE: u32 = 16_000;

fn write_tone(path: &Path, freq: Option<f64>, channels: u16) {
    let spec = WavSpec {
        channels,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for i in 0..SAMPLE_RATE as usize {
        let value = freq
            .map(|f| 0.5 * (2.0 * PI * f * i as f64 / SAMPLE_RATE as f64).sin())
            .unwrap_or(0.0);
        for _ in 0..channels {
            writer.write_sample((value * i16::MAX as f64) as i16).unwrap();
        }
    }
    writer.finalize().unwrap();
}

fn load_items(dir: &Path) -> Vec<BatchItem> {
    discover_wav_files(dir)
        .unwrap()
        .into_iter()
        .map(|path| {
            let id = path.file_name().unwrap().to_string_lossy().into_owned();
            match load_wav(&path) {
                Ok(buffer) => BatchItem::new(id, buffer),
                Err(err) => BatchItem::failed(id, err),
            }
        })
        .collect()
}

#[test]
fn guitar_recordings_are_identified_in_directory_order() {
    let dir = tempfile::tempdir().unwrap();
    write_tone(&dir.path().join("1_low_e.wav"), Some(82.0), 1);
    write_tone(&dir.path().join("2_silence.wav"), None, 1);
    write_tone(&dir.path().join("3_a_stereo.WAV"), Some(110.0), 2);
    std::fs::write(dir.path().join("4_broken.wav"), b"not a wav file").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

    let items = load_items(dir.path());
    assert_eq!(items.len(), 4);

    let table = NoteTable::standard_guitar();
    let result = process_batch(items, &table, &AnalysisConfig::default()).unwrap();

    let files: Vec<&str> = result.rows.iter().map(|row| row.file.as_str()).collect();
    assert_eq!(files, vec!["1_low_e.wav", "2_silence.wav", "3_a_stereo.WAV", "4_broken.wav"]);

    match &result.rows[0].outcome {
        RowOutcome::Matched(m) => {
            assert_eq!(m.note, "E2");
            assert_eq!(m.dominant_frequency, 82.0);
            // 82.41 Hz reference, 0.41 Hz off is within tolerance.
            assert_eq!(m.status, TuningStatus::InTune);
        }
        other => panic!("expected a match, got {:?}", other),
    }
    assert!(result.rows[1].is_failure());
    assert_eq!(result.rows[2].note(), "A2");
    assert!(result.rows[3].is_failure());
    assert_eq!(result.failures().count(), 2);
}

#[test]
fn csv_note_table_drives_matching() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("notes.csv");
    std::fs::write(
        &csv_path,
        "Note,1st Harmonic (Hz),2nd Harmonic (Hz)\nA3,220,440\nC4,261.63,523.25\n",
    )
    .unwrap();
    write_tone(&dir.path().join("tone.wav"), Some(444.0), 1);

    let table = NoteTable::from_csv_path(&csv_path).unwrap();
    let config = AnalysisConfig {
        workers: 2,
        ..Default::default()
    };
    let result = process_batch(load_items(dir.path()), &table, &config).unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result.rows[0].note(), "A3");
    assert_eq!(result.rows[0].status_label(), "too sharp");
    assert_eq!(result.rows[0].rounded_frequency(), Some(444.0));
}
