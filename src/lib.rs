//! Priority-vote arbitration of display modes and refresh-rate ranges.
//!
//! Producers (power policy, foreground apps, thermal throttling, the
//! brightness flicker-zone classifier) each submit at most one [`Vote`]
//! per priority into the shared [`VoteStorage`]. The [`ModeArbiter`]
//! resolves the votes for a display against its supported mode list by
//! priority relaxation: constraints are folded from a shrinking priority
//! band until at least one supported mode survives, so a conflicting vote
//! set degrades gracefully instead of failing.
//!
//! ```no_run
//! use std::sync::Arc;
//! use mode_arbiter::{Mode, ModeArbiter, Priority, SupportedModes, Vote};
//!
//! let arbiter = Arc::new(ModeArbiter::new());
//! arbiter.replace_supported_modes(
//!     0,
//!     SupportedModes::new(
//!         vec![
//!             Mode { id: 1, width: 1080, height: 2400, refresh_rate: 60.0, group: 0 },
//!             Mode { id: 2, width: 1080, height: 2400, refresh_rate: 120.0, group: 0 },
//!         ],
//!         1,
//!     ),
//! );
//!
//! arbiter
//!     .storage()
//!     .set_vote(None, Priority::LowPowerMode, Some(Vote::for_render_rates(0.0, 60.0)));
//! let spec = arbiter.resolve(0);
//! assert_eq!(spec.base_mode_id, 1);
//! ```

pub mod ambient;
pub mod brightness;
pub mod config;
pub mod director;
pub mod error;
pub mod mode;
pub mod notifier;
pub mod storage;
pub mod summary;
pub mod thermal;
pub mod vote;

pub use brightness::{BrightnessZoneClassifier, LightSensorHook};
pub use config::BlockingZoneConfig;
pub use director::{DesiredModeSpec, ModeArbiter, RefreshRateRanges, SwitchingPolicy};
pub use error::ConfigError;
pub use mode::{DisplayId, Mode, ModeId, SupportedModes};
pub use notifier::ChangeListener;
pub use storage::VoteStorage;
pub use thermal::{ThermalRateMap, ThermalSeverity};
pub use vote::{Priority, RefreshRateRange, SizeConstraint, Vote};
