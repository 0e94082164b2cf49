//! Arbitration entry point.
//!
//! The [`ModeArbiter`] owns the vote storage and the per-display supported
//! mode cache, and resolves the desired mode specification on demand. It is
//! notified of vote changes through the storage's debounced signal and
//! recomputes lazily: the listener only learns that the output *may* have
//! changed, and the next [`ModeArbiter::resolve`] call reads the freshest
//! snapshot.

use crate::mode::{DisplayId, ModeId, SupportedModes};
use crate::notifier::ChangeListener;
use crate::storage::VoteStorage;
use crate::summary::VoteSummary;
use crate::vote::{Priority, RefreshRateRange};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, warn};

/// How freely the system may switch between display modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwitchingPolicy {
    /// No mode or render rate switching at all.
    None,
    /// Seamless switches within a mode group only.
    #[default]
    WithinGroups,
    /// Switches across groups are also allowed.
    AcrossAndWithinGroups,
    /// Only the render frame rate may change; the physical mode is pinned.
    RenderFrameRateOnly,
}

/// A physical and render refresh rate range pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefreshRateRanges {
    pub physical: RefreshRateRange,
    pub render: RefreshRateRange,
}

impl RefreshRateRanges {
    fn pinned(rate: f32) -> Self {
        Self {
            physical: RefreshRateRange::new(rate, rate),
            render: RefreshRateRange::new(rate, rate),
        }
    }
}

/// The resolved output of one arbitration pass.
///
/// `app_request` is always a superset of `primary` on both range pairs. The
/// `Default` value (mode id 0, all ranges `[0, 0]`) is the sentinel returned
/// for displays with no registered mode set; it is distinguishable from any
/// real resolution, which always names a supported mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DesiredModeSpec {
    pub base_mode_id: ModeId,
    pub allow_group_switching: bool,
    /// The range the system may freely switch within.
    pub primary: RefreshRateRanges,
    /// The wider range a foreground app may additionally request.
    pub app_request: RefreshRateRanges,
}

impl Default for DesiredModeSpec {
    fn default() -> Self {
        Self {
            base_mode_id: 0,
            allow_group_switching: false,
            primary: RefreshRateRanges::pinned(0.0),
            app_request: RefreshRateRanges::pinned(0.0),
        }
    }
}

#[derive(Default)]
struct ArbiterState {
    modes_by_display: HashMap<DisplayId, SupportedModes>,
    policy: SwitchingPolicy,
    app_request_only: bool,
}

/// Per-display arbitration of votes into a single allowed mode and rate range.
pub struct ModeArbiter {
    storage: Arc<VoteStorage>,
    state: Mutex<ArbiterState>,
}

impl ModeArbiter {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(VoteStorage::new()),
            state: Mutex::new(ArbiterState::default()),
        }
    }

    /// The shared vote storage handed to producers.
    pub fn storage(&self) -> Arc<VoteStorage> {
        Arc::clone(&self.storage)
    }

    /// Registers the listener invoked (debounced, off-lock) whenever the
    /// resolved output may have changed.
    pub fn set_listener(&self, listener: Option<ChangeListener>) {
        self.storage.set_listener(listener);
    }

    /// Replaces the supported mode set of `display` and signals a change.
    pub fn replace_supported_modes(&self, display: DisplayId, modes: SupportedModes) {
        {
            let mut state = self.state.lock().expect("arbiter lock poisoned");
            state.modes_by_display.insert(display, modes);
        }
        self.storage.notify_external_change();
    }

    /// Sets the global mode switching policy.
    pub fn set_switching_policy(&self, policy: SwitchingPolicy) {
        let changed = {
            let mut state = self.state.lock().expect("arbiter lock poisoned");
            let changed = state.policy != policy;
            state.policy = policy;
            changed
        };
        if changed {
            self.storage.notify_external_change();
        }
    }

    pub fn switching_policy(&self) -> SwitchingPolicy {
        self.state.lock().expect("arbiter lock poisoned").policy
    }

    /// When enabled, resolution considers only the app-request priority band
    /// and ignores every other vote. A debug/test override.
    pub fn set_app_request_only(&self, enabled: bool) {
        let changed = {
            let mut state = self.state.lock().expect("arbiter lock poisoned");
            let changed = state.app_request_only != enabled;
            state.app_request_only = enabled;
            changed
        };
        if changed {
            self.storage.notify_external_change();
        }
    }

    /// Resolves the desired mode specification for `display` from the
    /// current vote snapshot and supported mode list.
    ///
    /// Never fails: an unsatisfiable vote set is relaxed priority by
    /// priority, and a display whose votes admit no mode at all falls back
    /// to its default mode with pinned rates. Only a display with no
    /// registered mode set yields the sentinel empty spec.
    pub fn resolve(&self, display: DisplayId) -> DesiredModeSpec {
        // `tracing` macros import `field::display` inside their expansion,
        // which shadows a local named `display`; log through an alias.
        let display_id = display;
        let (modes, policy, app_request_only) = {
            let state = self.state.lock().expect("arbiter lock poisoned");
            let Some(modes) = state.modes_by_display.get(&display).cloned() else {
                error!(display = display_id, "asked about unknown display, returning empty mode spec");
                return DesiredModeSpec::default();
            };
            (modes, state.policy, state.app_request_only)
        };

        let Some(default_mode) = modes.default_mode().copied() else {
            error!(display = display_id, "default mode id not in supported list, returning empty mode spec");
            return DesiredModeSpec::default();
        };

        let votes = self.storage.snapshot(display);

        let (mut low_idx, high_idx) = if app_request_only {
            let (lo, hi) = Priority::APP_REQUEST_BAND;
            (priority_index(lo), priority_index(hi))
        } else {
            (0, Priority::ALL.len() - 1)
        };

        // Find a priority band admitting at least one supported mode,
        // dropping the lowest considered priority on each failure.
        let mut primary = VoteSummary::new();
        let mut candidates = vec![default_mode];
        while low_idx <= high_idx {
            primary.apply_votes(&votes, Priority::ALL[low_idx], Priority::ALL[high_idx]);
            primary.adjust_size(&default_mode);

            candidates = primary.filter_modes(modes.modes(), &default_mode);
            if !candidates.is_empty() {
                break;
            }
            debug!(
                display = display_id,
                dropped = ?Priority::ALL[low_idx],
                "no mode satisfies the band, relaxing"
            );
            low_idx += 1;
        }

        let mut app_request = VoteSummary::new();
        app_request.apply_votes(&votes, Priority::APP_REQUEST_CUTOFF, Priority::MAX);
        app_request.limit_refresh_ranges(&primary);

        let Some(base_mode) = primary.select_base_mode(&candidates, &default_mode) else {
            warn!(
                display = display_id,
                ?votes,
                "no allowed mode satisfies the votes, falling back to the default mode"
            );
            let pinned = RefreshRateRanges::pinned(default_mode.refresh_rate);
            return DesiredModeSpec {
                base_mode_id: default_mode.id,
                allow_group_switching: false,
                primary: pinned,
                app_request: pinned,
            };
        };

        let mode_switching_disabled = matches!(
            policy,
            SwitchingPolicy::None | SwitchingPolicy::RenderFrameRateOnly
        );
        let base_rate = base_mode.refresh_rate;

        if mode_switching_disabled || primary.disable_mode_switching {
            primary.pin_physical_rate(base_rate);
            if mode_switching_disabled {
                app_request.pin_physical_rate(base_rate);
                primary.pin_render_rate(base_rate);
                if policy == SwitchingPolicy::None {
                    app_request.pin_render_rate(base_rate);
                }
            }
        }
        if primary.disable_render_switching {
            primary.pin_render_rate(base_rate);
        }

        DesiredModeSpec {
            base_mode_id: base_mode.id,
            allow_group_switching: policy == SwitchingPolicy::AcrossAndWithinGroups,
            primary: RefreshRateRanges {
                physical: primary.physical_range(),
                render: primary.render_range(),
            },
            app_request: RefreshRateRanges {
                physical: app_request.physical_range(),
                render: app_request.render_range(),
            },
        }
    }
}

impl Default for ModeArbiter {
    fn default() -> Self {
        Self::new()
    }
}

fn priority_index(priority: Priority) -> usize {
    Priority::ALL
        .iter()
        .position(|p| *p == priority)
        .expect("priority present in ALL")
}
