//! # Fast Fourier Transform (FFT) Module
//!
//! Converts a time-domain sample buffer into a magnitude spectrum.
//!
//! The input is real-valued audio, so the real-optimised forward transform
//! from `realfft` is used. It only produces the non-negative frequencies:
//! for `N` samples the spectrum has `N / 2 + 1` bins running from 0 Hz up to
//! the Nyquist frequency, bin `k` sitting at `k * Fs / N`.
//!
//! No window or DC removal is applied; magnitudes are the plain `|X[k]|`.
//! The transform runs in `f64` so that any finite `f32` input stays finite
//! and bin frequencies keep sub-millihertz resolution across the band.

use realfft::RealFftPlanner;
use rustfft::num_complex::Complex;

use crate::audio::SampleBuffer;
use crate::error::InputError;

/// Index-aligned frequency and magnitude bins, ordered by increasing frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub frequencies: Vec<f64>,
    pub magnitudes: Vec<f64>,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Distance in Hz between two neighbouring bins.
    pub fn bin_width(&self) -> f64 {
        match self.frequencies.as_slice() {
            [first, second, ..] => second - first,
            _ => 0.0,
        }
    }

    /// Iterates over `(frequency, magnitude)` pairs.
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.frequencies
            .iter()
            .copied()
            .zip(self.magnitudes.iter().copied())
    }

    /// Fails if any magnitude is NaN or infinite.
    pub fn ensure_finite(&self) -> Result<(), InputError> {
        match self.magnitudes.iter().position(|m| !m.is_finite()) {
            Some(index) => Err(InputError::InvalidSpectrum {
                reason: format!("magnitude of bin {} is {}", index, self.magnitudes[index]),
            }),
            None => Ok(()),
        }
    }
}

/// Computes the magnitude spectrum of a sample buffer.
///
/// # Arguments
/// * `buffer` - Mono samples and their sampling rate
///
/// # Returns
/// * `Ok(spectrum)` - `N / 2 + 1` bins from 0 Hz to `Fs / 2`
/// * `Err(InputError)` - Empty buffer, zero sample rate, non-finite samples
///   or a spectrum that is not finite
pub fn compute_spectrum(buffer: &SampleBuffer) -> Result<Spectrum, InputError> {
    buffer.validate()?;

    let len = buffer.samples.len();
    let mut planner = RealFftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(len);

    let mut input: Vec<f64> = buffer.samples.iter().map(|&s| f64::from(s)).collect();
    let mut output = fft.make_output_vec();
    fft.process(&mut input, &mut output)
        .map_err(|e| InputError::InvalidSpectrum {
            reason: e.to_string(),
        })?;

    let spectrum = Spectrum {
        frequencies: bin_frequencies(len, buffer.sample_rate),
        magnitudes: spectrum_to_magnitudes(&output),
    };
    spectrum.ensure_finite()?;
    Ok(spectrum)
}

/// Frequencies of the non-negative bins for an `len`-point real transform.
pub fn bin_frequencies(len: usize, sample_rate: u32) -> Vec<f64> {
    let step = f64::from(sample_rate) / len as f64;
    (0..=len / 2).map(|k| k as f64 * step).collect()
}

/// Extracts `|X[k]|` from a complex spectrum.
pub fn spectrum_to_magnitudes(spectrum: &[Complex<f64>]) -> Vec<f64> {
    spectrum
        .iter()
        .map(|c| c.norm()) // .norm() is sqrt(re^2 + im^2)
        .collect()
}
