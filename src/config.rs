//! Blocking-zone configuration: the thresholds, fixed rates, and thermal
//! maps that drive the brightness zone classifier.
//!
//! Loaded from JSON and validated fail-fast; a silently truncated threshold
//! array could hide a flicker-prevention regression, so mismatched lengths
//! are an error rather than a warning.

use crate::error::ConfigError;
use crate::thermal::ThermalRateMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration for the brightness blocking zones.
///
/// Thresholds come in pairs: `(display_thresholds[i], ambient_thresholds[i])`
/// describe one sub-zone; the zone is active when any pair is satisfied. A
/// negative entry means "not set" and lets the other dimension gate alone. A
/// zone with `refresh_rate <= 0` is disabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockingZoneConfig {
    /// Display brightness thresholds for the low (dim) zone.
    pub low_display_thresholds: Vec<f32>,
    /// Ambient lux thresholds for the low zone, paired with the above.
    pub low_ambient_thresholds: Vec<f32>,
    /// Fixed refresh rate while inside the low zone.
    pub low_zone_refresh_rate: f32,
    /// Thermal narrowing of the low-zone rate, if any.
    pub low_zone_thermal_ranges: ThermalRateMap,

    /// Display brightness thresholds for the high (bright) zone.
    pub high_display_thresholds: Vec<f32>,
    /// Ambient lux thresholds for the high zone, paired with the above.
    pub high_ambient_thresholds: Vec<f32>,
    /// Fixed refresh rate while inside the high zone.
    pub high_zone_refresh_rate: f32,
    /// Thermal narrowing of the high-zone rate, if any.
    pub high_zone_thermal_ranges: ThermalRateMap,
}

impl Default for BlockingZoneConfig {
    fn default() -> Self {
        Self {
            low_display_thresholds: Vec::new(),
            low_ambient_thresholds: Vec::new(),
            low_zone_refresh_rate: 0.0,
            low_zone_thermal_ranges: ThermalRateMap::default(),
            high_display_thresholds: Vec::new(),
            high_ambient_thresholds: Vec::new(),
            high_zone_refresh_rate: 0.0,
            high_zone_thermal_ranges: ThermalRateMap::default(),
        }
    }
}

impl BlockingZoneConfig {
    /// Validate configuration values.
    /// Returns Ok(()) if valid, Err with a descriptive message if invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.low_display_thresholds.len() != self.low_ambient_thresholds.len() {
            return Err(ConfigError::ThresholdLengthMismatch {
                zone: "low",
                display_len: self.low_display_thresholds.len(),
                ambient_len: self.low_ambient_thresholds.len(),
            });
        }
        if self.high_display_thresholds.len() != self.high_ambient_thresholds.len() {
            return Err(ConfigError::ThresholdLengthMismatch {
                zone: "high",
                display_len: self.high_display_thresholds.len(),
                ambient_len: self.high_ambient_thresholds.len(),
            });
        }
        if self.low_zone_refresh_rate < 0.0 {
            return Err(ConfigError::NegativeZoneRate {
                zone: "low",
                rate: self.low_zone_refresh_rate,
            });
        }
        if self.high_zone_refresh_rate < 0.0 {
            return Err(ConfigError::NegativeZoneRate {
                zone: "high",
                rate: self.high_zone_refresh_rate,
            });
        }
        self.low_zone_thermal_ranges.validate("low")?;
        self.high_zone_thermal_ranges.validate("high")?;
        Ok(())
    }

    /// Load and validate a configuration file.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Whether the low zone can ever activate.
    pub fn low_zone_enabled(&self) -> bool {
        self.low_zone_refresh_rate > 0.0 && has_valid_threshold(&self.low_display_thresholds)
            || self.low_zone_refresh_rate > 0.0
                && has_valid_threshold(&self.low_ambient_thresholds)
    }

    /// Whether the high zone can ever activate.
    pub fn high_zone_enabled(&self) -> bool {
        self.high_zone_refresh_rate > 0.0 && has_valid_threshold(&self.high_display_thresholds)
            || self.high_zone_refresh_rate > 0.0
                && has_valid_threshold(&self.high_ambient_thresholds)
    }

    /// Whether any zone gates on ambient light, which is what makes the
    /// light sensor worth observing at all.
    pub fn observes_ambient_light(&self) -> bool {
        (self.low_zone_refresh_rate > 0.0 && has_valid_threshold(&self.low_ambient_thresholds))
            || (self.high_zone_refresh_rate > 0.0
                && has_valid_threshold(&self.high_ambient_thresholds))
    }
}

/// At least one entry is set (non-negative), so the array can gate a zone.
fn has_valid_threshold(thresholds: &[f32]) -> bool {
    thresholds.iter().any(|t| *t >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thermal::ThermalSeverity;
    use crate::vote::RefreshRateRange;
    use std::collections::BTreeMap;
    use std::io::Write;
    use tempfile::tempdir;

    fn sample_config() -> BlockingZoneConfig {
        BlockingZoneConfig {
            low_display_thresholds: vec![5.0],
            low_ambient_thresholds: vec![10.0],
            low_zone_refresh_rate: 60.0,
            high_display_thresholds: vec![400.0],
            high_ambient_thresholds: vec![8000.0],
            high_zone_refresh_rate: 120.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config_is_valid_and_disabled() {
        let config = BlockingZoneConfig::default();
        config.validate().unwrap();
        assert!(!config.low_zone_enabled());
        assert!(!config.high_zone_enabled());
        assert!(!config.observes_ambient_light());
    }

    #[test]
    fn test_sample_config_enables_both_zones() {
        let config = sample_config();
        config.validate().unwrap();
        assert!(config.low_zone_enabled());
        assert!(config.high_zone_enabled());
        assert!(config.observes_ambient_light());
    }

    #[test]
    fn test_mismatched_threshold_lengths_rejected() {
        let config = BlockingZoneConfig {
            low_display_thresholds: vec![5.0, 10.0],
            low_ambient_thresholds: vec![10.0],
            low_zone_refresh_rate: 60.0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::ThresholdLengthMismatch { zone: "low", .. }));
    }

    #[test]
    fn test_negative_zone_rate_rejected() {
        let config = BlockingZoneConfig {
            low_zone_refresh_rate: -60.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NegativeZoneRate { zone: "low", .. })
        ));
    }

    #[test]
    fn test_all_negative_thresholds_disable_zone() {
        let config = BlockingZoneConfig {
            low_display_thresholds: vec![-1.0],
            low_ambient_thresholds: vec![-1.0],
            low_zone_refresh_rate: 60.0,
            ..Default::default()
        };
        config.validate().unwrap();
        assert!(!config.low_zone_enabled());
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = sample_config();
        let mut ranges = BTreeMap::new();
        ranges.insert(ThermalSeverity::Severe, RefreshRateRange::new(60.0, 60.0));
        config.low_zone_thermal_ranges = ThermalRateMap::new(ranges);

        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: BlockingZoneConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("zones.json");
        let json = serde_json::to_string(&sample_config()).unwrap();
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let loaded = BlockingZoneConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded, sample_config());
    }

    #[test]
    fn test_load_from_path_rejects_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("zones.json");
        let mut bad = sample_config();
        bad.low_ambient_thresholds.push(3.0);
        let json = serde_json::to_string(&bad).unwrap();
        fs::write(&path, json).unwrap();

        assert!(BlockingZoneConfig::load_from_path(&path).is_err());
    }

    #[test]
    fn test_load_missing_file_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(
            BlockingZoneConfig::load_from_path(&path),
            Err(ConfigError::ReadFailed { .. })
        ));
    }
}
