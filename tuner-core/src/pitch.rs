//! # Peak Filter Module
//!
//! Reduces a spectrum to its significant bins and picks the dominant frequency.
//!
//! A bin is significant when its magnitude is strictly greater than
//! `threshold_ratio * max(magnitude)`. The dominant frequency is always taken
//! from the filtered set, so weak bins can never become dominant. When several
//! bins share the maximum magnitude the lowest frequency wins.

use crate::error::InputError;
use crate::fft::Spectrum;

/// The bins that survived the threshold, plus the dominant one.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredPeaks {
    pub frequencies: Vec<f64>,
    pub magnitudes: Vec<f64>,
    /// Magnitude a bin had to exceed to be kept.
    pub threshold: f64,
    pub dominant_frequency: f64,
    pub dominant_magnitude: f64,
}

/// Filters a spectrum against a fraction of its peak magnitude.
///
/// # Arguments
/// * `spectrum` - Magnitude spectrum, ordered by increasing frequency
/// * `threshold_ratio` - Fraction of the peak a bin must exceed (0.1 by default)
///
/// # Returns
/// * `Ok(peaks)` - Retained bins and the dominant frequency
/// * `Err(InputError::EmptyBuffer)` - The spectrum has no bins
/// * `Err(InputError::Silence)` - Every magnitude is zero, nothing is retained
/// * `Err(InputError::InvalidSpectrum)` - A magnitude is NaN or infinite
pub fn filter_peaks(
    spectrum: &Spectrum,
    threshold_ratio: f64,
) -> Result<FilteredPeaks, InputError> {
    if spectrum.is_empty() {
        return Err(InputError::EmptyBuffer);
    }
    spectrum.ensure_finite()?;

    let peak = spectrum.magnitudes.iter().copied().fold(0.0_f64, f64::max);
    let threshold = threshold_ratio * peak;

    let (frequencies, magnitudes): (Vec<f64>, Vec<f64>) = spectrum
        .bins()
        .filter(|&(_, magnitude)| magnitude > threshold)
        .unzip();

    let (dominant_frequency, dominant_magnitude) =
        strongest_bin(&frequencies, &magnitudes).ok_or(InputError::Silence)?;

    Ok(FilteredPeaks {
        frequencies,
        magnitudes,
        threshold,
        dominant_frequency,
        dominant_magnitude,
    })
}

/// Convenience wrapper returning only the dominant frequency.
pub fn dominant_frequency(spectrum: &Spectrum, threshold_ratio: f64) -> Result<f64, InputError> {
    filter_peaks(spectrum, threshold_ratio).map(|peaks| peaks.dominant_frequency)
}

/// First bin with the maximal magnitude. `None` when there are no bins.
fn strongest_bin(frequencies: &[f64], magnitudes: &[f64]) -> Option<(f64, f64)> {
    let mut best: Option<(f64, f64)> = None;
    for (&frequency, &magnitude) in frequencies.iter().zip(magnitudes) {
        // Strict comparison keeps the earliest (lowest frequency) maximum.
        if best.is_none_or(|(_, m)| magnitude > m) {
            best = Some((frequency, magnitude));
        }
    }
    best
}
