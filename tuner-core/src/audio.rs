//! # Audio Input Module
//!
//! This module supplies the pipeline with decoded sample buffers.
//! It reads waveform files with `hound`, normalises every supported PCM
//! format to `f32` in the range [-1.0, 1.0] and folds multi-channel audio
//! down to a single channel.
//!
//! ## Features
//! - 8/16/24/32-bit integer and 32-bit float WAV decoding
//! - Mono mix-down by channel averaging
//! - Deterministic discovery of `*.wav` files in a directory

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader};
use log::debug;

use crate::error::{AudioError, InputError};

/// A mono sequence of amplitude values together with its sampling rate.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    pub samples: Vec<f32>,
    /// Sampling rate in Hz.
    pub sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Creates a buffer at [`crate::config::DEFAULT_SAMPLE_RATE`].
    pub fn with_default_rate(samples: Vec<f32>) -> Self {
        Self::new(samples, crate::config::DEFAULT_SAMPLE_RATE)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Rejects buffers the spectral transform cannot work with.
    ///
    /// # Returns
    /// * `Err(InputError::EmptyBuffer)` - No samples
    /// * `Err(InputError::ZeroSampleRate)` - Sampling rate of 0 Hz
    /// * `Err(InputError::NonFiniteSample)` - A NaN or infinite sample
    pub fn validate(&self) -> Result<(), InputError> {
        if self.samples.is_empty() {
            return Err(InputError::EmptyBuffer);
        }
        if self.sample_rate == 0 {
            return Err(InputError::ZeroSampleRate);
        }
        if let Some(index) = self.samples.iter().position(|s| !s.is_finite()) {
            return Err(InputError::NonFiniteSample { index });
        }
        Ok(())
    }
}

/// Decodes a WAV file into a mono [`SampleBuffer`].
///
/// The sampling rate is taken from the file header.
///
/// # Arguments
/// * `path` - Path to the `.wav` file
///
/// # Returns
/// * `Ok(buffer)` - Normalised mono samples and the header sample rate
/// * `Err(AudioError)` - The file could not be opened or decoded
pub fn load_wav(path: impl AsRef<Path>) -> Result<SampleBuffer, AudioError> {
    let path = path.as_ref();
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader.samples::<f32>().collect::<Result<_, _>>()?,
        (SampleFormat::Int, bits @ (8 | 16 | 24 | 32)) => {
            // hound already recentres unsigned 8-bit data around zero.
            let scale = (1_i64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / scale))
                .collect::<Result<_, _>>()?
        }
        (format, bits) => {
            return Err(AudioError::UnsupportedFormat(format!(
                "{:?} with {} bits per sample",
                format, bits
            )));
        }
    };

    let samples = mix_to_mono(&interleaved, spec.channels);
    debug!(
        "decoded {}: {} Hz, {} channel(s), {} frames",
        path.display(),
        spec.sample_rate,
        spec.channels,
        samples.len()
    );

    Ok(SampleBuffer::new(samples, spec.sample_rate))
}

/// Averages interleaved frames into one channel.
fn mix_to_mono(interleaved: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    let channels = channels as usize;
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Lists every `.wav` file directly inside `dir`, sorted by path.
///
/// The extension match is case-insensitive. Sub-directories are not searched.
pub fn discover_wav_files(dir: impl AsRef<Path>) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_wav = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
        if is_wav && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
