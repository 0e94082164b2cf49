//! Thermal throttling severity and the severity-to-range lookup used to
//! narrow flicker-zone votes under thermal pressure.

use crate::error::ConfigError;
use crate::vote::RefreshRateRange;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Thermal throttling severity, mildest to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ThermalSeverity {
    #[default]
    None,
    Light,
    Moderate,
    Severe,
    Critical,
    Emergency,
    Shutdown,
}

/// Monotonically ordered map from thermal severity to the refresh rate range
/// allowed at that severity and above (until a more severe entry applies).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThermalRateMap {
    ranges: BTreeMap<ThermalSeverity, RefreshRateRange>,
}

impl ThermalRateMap {
    pub fn new(ranges: BTreeMap<ThermalSeverity, RefreshRateRange>) -> Self {
        Self { ranges }
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The range of the highest severity entry at or below `severity`; the
    /// most specific applicable entry. `None` when no entry applies yet.
    pub fn best_matching_range(&self, severity: ThermalSeverity) -> Option<RefreshRateRange> {
        self.ranges.range(..=severity).next_back().map(|(_, r)| *r)
    }

    pub(crate) fn validate(&self, zone: &'static str) -> Result<(), ConfigError> {
        for (severity, range) in &self.ranges {
            if range.min > range.max {
                return Err(ConfigError::InvertedThermalRange {
                    zone,
                    severity: *severity,
                    min: range.min,
                    max: range.max,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_map() -> ThermalRateMap {
        let mut ranges = BTreeMap::new();
        ranges.insert(ThermalSeverity::Moderate, RefreshRateRange::new(60.0, 90.0));
        ranges.insert(ThermalSeverity::Critical, RefreshRateRange::new(60.0, 60.0));
        ThermalRateMap::new(ranges)
    }

    #[test]
    fn test_below_first_entry_has_no_match() {
        let map = sample_map();
        assert_eq!(map.best_matching_range(ThermalSeverity::None), None);
        assert_eq!(map.best_matching_range(ThermalSeverity::Light), None);
    }

    #[test]
    fn test_exact_and_between_severities() {
        let map = sample_map();
        assert_eq!(
            map.best_matching_range(ThermalSeverity::Moderate),
            Some(RefreshRateRange::new(60.0, 90.0))
        );
        // Severe has no entry of its own; the Moderate entry still applies.
        assert_eq!(
            map.best_matching_range(ThermalSeverity::Severe),
            Some(RefreshRateRange::new(60.0, 90.0))
        );
    }

    #[test]
    fn test_above_last_entry_uses_most_severe() {
        let map = sample_map();
        assert_eq!(
            map.best_matching_range(ThermalSeverity::Shutdown),
            Some(RefreshRateRange::new(60.0, 60.0))
        );
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let mut ranges = BTreeMap::new();
        ranges.insert(ThermalSeverity::Severe, RefreshRateRange::new(90.0, 60.0));
        let map = ThermalRateMap::new(ranges);
        assert!(map.validate("low").is_err());
    }
}
