//! Error types for the mode arbiter.
//!
//! Arbitration itself never fails: unsatisfiable vote sets are resolved by
//! priority relaxation and unknown displays produce a logged sentinel result.
//! Only configuration loading and validation surface errors, and only at
//! initialization time.

use thiserror::Error;

/// Errors related to blocking-zone and thermal configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error(
        "{zone} zone threshold arrays have different lengths: \
         display has {display_len} entries, ambient has {ambient_len}"
    )]
    ThresholdLengthMismatch {
        zone: &'static str,
        display_len: usize,
        ambient_len: usize,
    },

    #[error("{zone} zone refresh rate must not be negative, got {rate}")]
    NegativeZoneRate { zone: &'static str, rate: f32 },

    #[error(
        "{zone} zone thermal range for severity {severity:?} is inverted: \
         min {min} > max {max}"
    )]
    InvertedThermalRange {
        zone: &'static str,
        severity: crate::thermal::ThermalSeverity,
        min: f32,
        max: f32,
    },
}
