//! Display mode model.
//!
//! Supplied by the display-enumeration collaborator and treated as read-only
//! input during a resolution pass.

use crate::vote::rates_equal;

/// Identifier of a physical display.
pub type DisplayId = u64;

/// Identifier of a display mode, unique within one display.
pub type ModeId = u32;

/// One supported display mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mode {
    pub id: ModeId,
    pub width: u32,
    pub height: u32,
    /// Physical refresh rate in Hz.
    pub refresh_rate: f32,
    /// Mode group: switching within a group is seamless; switching across
    /// groups may glitch and is gated by the switching policy.
    pub group: u32,
}

impl Mode {
    pub fn new(id: ModeId, width: u32, height: u32, refresh_rate: f32, group: u32) -> Self {
        Self { id, width, height, refresh_rate, group }
    }

    /// Whether this mode has the same resolution and refresh rate as `other`,
    /// within rate tolerance.
    pub fn matches(&self, other: &Mode) -> bool {
        self.width == other.width
            && self.height == other.height
            && rates_equal(self.refresh_rate, other.refresh_rate)
    }
}

/// The ordered mode list of one display plus its designated default mode.
#[derive(Debug, Clone, PartialEq)]
pub struct SupportedModes {
    modes: Vec<Mode>,
    default_mode_id: ModeId,
}

impl SupportedModes {
    pub fn new(modes: Vec<Mode>, default_mode_id: ModeId) -> Self {
        Self { modes, default_mode_id }
    }

    pub fn modes(&self) -> &[Mode] {
        &self.modes
    }

    /// The designated default mode, or `None` when the id doesn't name a
    /// supported mode (a collaborator bug the resolver treats as an unknown
    /// display).
    pub fn default_mode(&self) -> Option<&Mode> {
        self.modes.iter().find(|m| m.id == self.default_mode_id)
    }

    pub fn find(&self, id: ModeId) -> Option<&Mode> {
        self.modes.iter().find(|m| m.id == id)
    }

    /// Highest physical refresh rate among the supported modes.
    pub fn max_refresh_rate(&self) -> f32 {
        self.modes
            .iter()
            .map(|m| m.refresh_rate)
            .fold(0.0f32, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_modes() -> SupportedModes {
        SupportedModes::new(
            vec![
                Mode::new(1, 1920, 1080, 60.0, 0),
                Mode::new(2, 1920, 1080, 120.0, 0),
                Mode::new(3, 1280, 720, 120.0, 1),
            ],
            1,
        )
    }

    #[test]
    fn test_default_mode_lookup() {
        let modes = sample_modes();
        assert_eq!(modes.default_mode().unwrap().id, 1);
    }

    #[test]
    fn test_default_mode_missing() {
        let modes = SupportedModes::new(vec![Mode::new(7, 800, 600, 60.0, 0)], 1);
        assert!(modes.default_mode().is_none());
    }

    #[test]
    fn test_max_refresh_rate() {
        assert_eq!(sample_modes().max_refresh_rate(), 120.0);
    }

    #[test]
    fn test_mode_matches_within_tolerance() {
        let a = Mode::new(1, 1920, 1080, 60.0, 0);
        let b = Mode::new(9, 1920, 1080, 60.0001, 3);
        assert!(a.matches(&b));
        let c = Mode::new(9, 1920, 1080, 90.0, 0);
        assert!(!a.matches(&c));
    }
}
