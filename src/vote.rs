//! Vote model: prioritized constraints on display mode selection.
//!
//! Every producer expresses its requirement as an immutable [`Vote`] bound to
//! exactly one [`Priority`]. The arbiter folds votes in priority order, so a
//! higher-priority constraint never loses to a lower one.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance for floating-point refresh rate comparisons. Some refresh rates
/// are derived from frame timings and aren't exactly equal to the nominal
/// rate, so all rate comparisons allow this slack.
pub const FLOAT_TOLERANCE: f32 = 0.01;

/// Returns true if two refresh rates are equal within [`FLOAT_TOLERANCE`].
pub fn rates_equal(a: f32, b: f32) -> bool {
    (a - b).abs() < FLOAT_TOLERANCE
}

/// Priority levels for votes, lowest to highest.
///
/// At most one vote may be active per (display, priority) pair. The derived
/// `Ord` is the arbitration order: when the vote set admits no supported
/// mode, the lowest considered priority is dropped first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// System-wide default render frame rate cap.
    DefaultRenderRate,
    /// Fixed refresh rate while inside a brightness flicker zone.
    FlickerRate,
    /// User-configured minimum render frame rate.
    UserMinRenderRate,
    /// Foreground app's requested render frame rate range.
    AppRequestRenderRate,
    /// Foreground app's preferred base mode refresh rate.
    AppRequestBaseMode,
    /// Foreground app's requested resolution.
    AppRequestSize,
    /// User-configured peak render frame rate.
    UserPeakRenderRate,
    /// Battery-saver refresh rate cap.
    LowPowerMode,
    /// Mode-switching disable while inside a brightness flicker zone.
    FlickerSwitching,
    /// Skin-temperature throttling range.
    SkinTemperature,
    /// Proximity-sensor timing requirement.
    Proximity,
    /// Biometric sensor (under-display fingerprint) timing requirement.
    BiometricTiming,
}

impl Priority {
    /// All priorities in ascending order.
    pub const ALL: [Priority; 12] = [
        Priority::DefaultRenderRate,
        Priority::FlickerRate,
        Priority::UserMinRenderRate,
        Priority::AppRequestRenderRate,
        Priority::AppRequestBaseMode,
        Priority::AppRequestSize,
        Priority::UserPeakRenderRate,
        Priority::LowPowerMode,
        Priority::FlickerSwitching,
        Priority::SkinTemperature,
        Priority::Proximity,
        Priority::BiometricTiming,
    ];

    pub const MIN: Priority = Priority::DefaultRenderRate;
    pub const MAX: Priority = Priority::BiometricTiming;

    /// Lowest priority whose votes still bound the app-request summary.
    /// Votes below this cutoff never restrict what a foreground app may ask
    /// for beyond the system-chosen default.
    pub const APP_REQUEST_CUTOFF: Priority = Priority::AppRequestRenderRate;

    /// Priority band considered when the arbiter runs in app-request-only
    /// mode (a debug/test override).
    pub const APP_REQUEST_BAND: (Priority, Priority) =
        (Priority::AppRequestRenderRate, Priority::AppRequestSize);
}

/// An inclusive refresh rate range in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RefreshRateRange {
    pub min: f32,
    pub max: f32,
}

impl RefreshRateRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// The unconstrained range: `[0, +inf]`.
    pub fn unbounded() -> Self {
        Self { min: 0.0, max: f32::INFINITY }
    }

    /// Whether `rate` lies inside the range, within tolerance.
    pub fn contains(&self, rate: f32) -> bool {
        rate >= self.min - FLOAT_TOLERANCE && rate <= self.max + FLOAT_TOLERANCE
    }

    /// Collapses the range to a single rate.
    pub fn pin(&mut self, rate: f32) {
        self.min = rate;
        self.max = rate;
    }
}

impl fmt::Display for RefreshRateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.1}, {:.1}]", self.min, self.max)
    }
}

/// Inclusive bounds on the physical resolution a mode may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeConstraint {
    pub min_width: u32,
    pub min_height: u32,
    pub max_width: u32,
    pub max_height: u32,
}

impl SizeConstraint {
    /// Exactly one resolution.
    pub fn exact(width: u32, height: u32) -> Self {
        Self {
            min_width: width,
            min_height: height,
            max_width: width,
            max_height: height,
        }
    }
}

/// A single constraint on mode/refresh-rate selection.
///
/// Immutable once constructed; producers replace the whole vote on every
/// signal change and clear it when the signal goes inactive. Fields that are
/// `None` contribute no constraint when the vote is folded into a summary.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Vote {
    /// Allowed physical (panel) refresh rate range.
    pub physical_rate_range: Option<RefreshRateRange>,
    /// Allowed render frame rate range.
    pub render_rate_range: Option<RefreshRateRange>,
    /// Allowed resolution bounds.
    pub size: Option<SizeConstraint>,
    /// Preferred refresh rate for the base mode.
    pub base_mode_rate: Option<f32>,
    /// Forbid switching between physical modes.
    pub disable_mode_switching: bool,
    /// Forbid render frame rate switching.
    pub disable_render_switching: bool,
}

impl Vote {
    /// Vote for a physical refresh rate range.
    pub fn for_physical_rates(min: f32, max: f32) -> Self {
        Self {
            physical_rate_range: Some(RefreshRateRange::new(min, max)),
            ..Default::default()
        }
    }

    /// Vote for a render frame rate range.
    pub fn for_render_rates(min: f32, max: f32) -> Self {
        Self {
            render_rate_range: Some(RefreshRateRange::new(min, max)),
            ..Default::default()
        }
    }

    /// Vote for a preferred base mode refresh rate, the shape app-request
    /// producers use.
    pub fn for_base_mode_rate(rate: f32) -> Self {
        Self {
            base_mode_rate: Some(rate),
            ..Default::default()
        }
    }

    /// Vote restricting the resolution to exactly `width` x `height`.
    pub fn for_size(width: u32, height: u32) -> Self {
        Self {
            size: Some(SizeConstraint::exact(width, height)),
            ..Default::default()
        }
    }

    /// Vote forbidding physical mode switching.
    pub fn for_disable_mode_switching() -> Self {
        Self {
            disable_mode_switching: true,
            ..Default::default()
        }
    }

    /// Vote forbidding render frame rate switching.
    pub fn for_disable_render_switching() -> Self {
        Self {
            disable_render_switching: true,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_order_is_total_and_matches_all() {
        for pair in Priority::ALL.windows(2) {
            assert!(pair[0] < pair[1], "{:?} should sort below {:?}", pair[0], pair[1]);
        }
        assert_eq!(Priority::ALL[0], Priority::MIN);
        assert_eq!(Priority::ALL[Priority::ALL.len() - 1], Priority::MAX);
    }

    #[test]
    fn test_app_request_band_within_order() {
        let (lo, hi) = Priority::APP_REQUEST_BAND;
        assert!(lo <= hi);
        assert_eq!(lo, Priority::APP_REQUEST_CUTOFF);
        assert!(hi < Priority::LowPowerMode);
    }

    #[test]
    fn test_range_contains_with_tolerance() {
        let range = RefreshRateRange::new(60.0, 90.0);
        assert!(range.contains(60.0));
        assert!(range.contains(59.995));
        assert!(range.contains(90.005));
        assert!(!range.contains(59.9));
        assert!(!range.contains(90.1));
    }

    #[test]
    fn test_unbounded_range_contains_everything() {
        let range = RefreshRateRange::unbounded();
        assert!(range.contains(0.0));
        assert!(range.contains(1000.0));
    }

    #[test]
    fn test_vote_constructors_populate_single_field() {
        let v = Vote::for_physical_rates(60.0, 60.0);
        assert!(v.physical_rate_range.is_some());
        assert!(v.render_rate_range.is_none());
        assert!(!v.disable_mode_switching);

        let v = Vote::for_disable_mode_switching();
        assert!(v.disable_mode_switching);
        assert!(v.physical_rate_range.is_none());
    }
}
