//! # Analysis Configuration Module
//!
//! Every tunable of the pipeline lives in [`AnalysisConfig`] and is passed
//! explicitly to the stages that need it.
//!
//! ## Parameters
//! - Optional sample rate forced onto every buffer
//! - Peak filter threshold ratio
//! - Tuning tolerance in Hz
//! - Worker count for batch processing

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Sample rate assumed for raw sample arrays with no declared rate.
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;

/// Fraction of the spectral peak a bin must exceed to survive the filter.
pub const DEFAULT_THRESHOLD_RATIO: f64 = 0.1;

/// Maximum deviation, in Hz, still considered in tune.
pub const DEFAULT_TOLERANCE_HZ: f64 = 1.0;

/// Parameters for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// When set, replaces the declared rate of every buffer in a batch.
    pub sample_rate_override: Option<u32>,
    pub threshold_ratio: f64,
    pub tolerance_hz: f64,
    /// 1 processes the batch on the calling thread.
    pub workers: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate_override: None,
            threshold_ratio: DEFAULT_THRESHOLD_RATIO,
            tolerance_hz: DEFAULT_TOLERANCE_HZ,
            workers: 1,
        }
    }
}

impl AnalysisConfig {
    /// Checks that every parameter is in range.
    ///
    /// # Returns
    /// * `Ok(())` - All parameters are usable
    /// * `Err(ConfigError::InvalidParameter)` - The first offending parameter
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate_override == Some(0) {
            return Err(invalid("sample_rate_override", "must be greater than zero"));
        }
        if !(0.0..1.0).contains(&self.threshold_ratio) {
            return Err(invalid(
                "threshold_ratio",
                format!("must be in [0, 1), got {}", self.threshold_ratio),
            ));
        }
        if !self.tolerance_hz.is_finite() || self.tolerance_hz < 0.0 {
            return Err(invalid(
                "tolerance_hz",
                format!("must be a finite value >= 0, got {}", self.tolerance_hz),
            ));
        }
        if self.workers == 0 {
            return Err(invalid("workers", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sample_rate_override, None);
        assert_eq!(config.threshold_ratio, 0.1);
        assert_eq!(config.tolerance_hz, 1.0);
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        let cases = [
            AnalysisConfig {
                threshold_ratio: 1.0,
                ..Default::default()
            },
            AnalysisConfig {
                threshold_ratio: -0.1,
                ..Default::default()
            },
            AnalysisConfig {
                tolerance_hz: f64::NAN,
                ..Default::default()
            },
            AnalysisConfig {
                tolerance_hz: -1.0,
                ..Default::default()
            },
            AnalysisConfig {
                sample_rate_override: Some(0),
                ..Default::default()
            },
            AnalysisConfig {
                workers: 0,
                ..Default::default()
            },
        ];

        for config in cases.iter() {
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidParameter { .. })),
                "{:?} should be rejected",
                config
            );
        }
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: AnalysisConfig = serde_json::from_str(r#"{ "tolerance_hz": 2.5 }"#).unwrap();
        assert_eq!(config.tolerance_hz, 2.5);
        assert_eq!(config.threshold_ratio, DEFAULT_THRESHOLD_RATIO);
        assert_eq!(config.workers, 1);
    }
}
