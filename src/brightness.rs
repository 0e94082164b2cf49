//! Brightness flicker-zone classifier.
//!
//! Low-brightness displays can flicker visibly when the panel switches
//! refresh rates, and very bright scenes have an analogous high zone. The
//! classifier watches display brightness and smoothed ambient lux, decides
//! zone membership against configured threshold pairs, and asserts a pair of
//! votes while inside a zone: a pinned physical rate at
//! [`Priority::FlickerRate`] and a mode-switching disable at
//! [`Priority::FlickerSwitching`]. Thermal pressure can swap the pinned rate
//! for a configured range.

use crate::ambient::AmbientFilter;
use crate::config::BlockingZoneConfig;
use crate::storage::VoteStorage;
use crate::thermal::ThermalSeverity;
use crate::vote::{Priority, RefreshRateRange, Vote};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Cadence of the ambient light sensor and of re-injected samples.
const LIGHT_SENSOR_RATE_MS: u64 = 250;

/// Hooks the embedder implements to start and stop the signal sources the
/// classifier wants to hear from. Both calls are cheap state toggles made
/// while no classifier lock is held.
pub trait LightSensorHook: Send + Sync {
    /// Start or stop delivering ambient lux samples via
    /// [`BrightnessZoneClassifier::on_ambient_lux`].
    fn set_light_sensor_enabled(&self, enabled: bool);

    /// Start or stop delivering thermal status updates via
    /// [`BrightnessZoneClassifier::on_thermal_status`].
    fn set_thermal_updates_enabled(&self, _enabled: bool) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Zone {
    #[default]
    None,
    Low,
    High,
}

#[derive(Default)]
struct ZoneState {
    filter: AmbientFilter,
    /// Most recent raw sensor reading, independent of smoothing.
    raw_lux: Option<f32>,
    last_timestamp_ms: u64,
    smoothed_lux: Option<f32>,
    brightness: Option<f32>,
    zone: Zone,
    thermal: ThermalSeverity,
    display_on: bool,
    low_power: bool,
    rate_min: f32,
    rate_max: f32,
    observing_light: bool,
    observing_thermal: bool,
}

impl ZoneState {
    fn refresh_rate_changeable(&self) -> bool {
        self.rate_max - self.rate_min > 1.0 && self.rate_max > 60.0
    }

    /// Votes may only be asserted while the display is on, the achievable
    /// rate range is actually changeable, and battery saver is off.
    fn voting_allowed(&self) -> bool {
        self.display_on && !self.low_power && self.refresh_rate_changeable()
    }
}

/// The flicker vote pair the classifier wants active right now. `None`
/// entries clear the corresponding slot in storage.
struct VoteUpdate {
    rate: Option<Vote>,
    switching: Option<Vote>,
}

impl VoteUpdate {
    const CLEAR: VoteUpdate = VoteUpdate { rate: None, switching: None };
}

/// Classifies brightness/lux into flicker risk zones and maintains the
/// global flicker votes accordingly.
///
/// All inputs are push-style; the embedder forwards sensor, thermal,
/// power, and display-state signals. Constructed behind an `Arc` because
/// the boundary re-injection timer holds a `Weak` handle back to the
/// classifier and cancels itself when the classifier is dropped.
pub struct BrightnessZoneClassifier {
    storage: Arc<VoteStorage>,
    config: BlockingZoneConfig,
    state: Mutex<ZoneState>,
    hook: Mutex<Option<Arc<dyn LightSensorHook>>>,
    injector: Mutex<Option<JoinHandle<()>>>,
}

impl BrightnessZoneClassifier {
    pub fn new(storage: Arc<VoteStorage>, config: BlockingZoneConfig) -> Arc<Self> {
        Arc::new(Self {
            storage,
            config,
            state: Mutex::new(ZoneState {
                display_on: true,
                ..Default::default()
            }),
            hook: Mutex::new(None),
            injector: Mutex::new(None),
        })
    }

    /// Registers the embedder hook and immediately reports the current
    /// observation wants to it.
    pub fn set_sensor_hook(&self, hook: Option<Arc<dyn LightSensorHook>>) {
        let (light, thermal) = {
            let state = self.state.lock().expect("zone state lock poisoned");
            (state.observing_light, state.observing_thermal)
        };
        let mut slot = self.hook.lock().expect("hook lock poisoned");
        *slot = hook;
        if let Some(hook) = slot.as_ref() {
            hook.set_light_sensor_enabled(light);
            hook.set_thermal_updates_enabled(thermal);
        }
    }

    /// Feeds one ambient light sample. Timestamps are caller-supplied
    /// milliseconds on a monotonic-ish clock; out-of-order values are
    /// tolerated by the filter.
    pub fn on_ambient_lux(self: &Arc<Self>, timestamp_ms: u64, lux: f32) {
        let (update, rearm) = {
            let mut state = self.state.lock().expect("zone state lock poisoned");
            if !state.observing_light {
                debug!(lux, "ambient sample ignored while not observing");
                return;
            }

            // Compare against the estimate decayed to the sample time, not
            // the cached value from the previous event.
            let current = state.filter.estimate(timestamp_ms);
            if let Some(current) = current {
                if self.crossed_entering(lux, current) {
                    // Entering a risk zone must take effect immediately.
                    state.filter.clear();
                }
            }
            state.filter.add_value(timestamp_ms, lux);
            state.raw_lux = Some(lux);
            state.last_timestamp_ms = timestamp_ms;
            state.smoothed_lux = state.filter.estimate(timestamp_ms);

            let update = self.evaluate(&mut state);
            // While raw and smoothed disagree about a boundary the sensor
            // may go quiet; keep re-polling the filter until they settle.
            let rearm = self.raw_smoothed_disagree(&state);
            (update, rearm)
        };

        self.cancel_injector();
        if rearm {
            self.arm_injector();
        }
        self.apply(update);
    }

    /// Updates the display brightness (nits) used for zone membership.
    pub fn on_brightness_changed(&self, brightness: f32) {
        let update = {
            let mut state = self.state.lock().expect("zone state lock poisoned");
            state.brightness = Some(brightness);
            self.evaluate(&mut state)
        };
        self.apply(update);
    }

    /// Updates the thermal throttling severity, possibly narrowing the
    /// asserted zone vote.
    pub fn on_thermal_status(&self, severity: ThermalSeverity) {
        let update = {
            let mut state = self.state.lock().expect("zone state lock poisoned");
            if state.thermal == severity {
                return;
            }
            debug!(?severity, "thermal status changed");
            state.thermal = severity;
            self.evaluate(&mut state)
        };
        self.apply(update);
    }

    /// Signals the default display turning on or off.
    pub fn on_display_state_changed(&self, display_on: bool) {
        self.gating_changed(|state| state.display_on = display_on);
    }

    /// Signals battery saver toggling. Activation force-clears both flicker
    /// votes even if a zone was active.
    pub fn on_low_power_mode(&self, enabled: bool) {
        self.gating_changed(|state| state.low_power = enabled);
    }

    /// Updates the achievable refresh rate range of the default display. A
    /// range that cannot meaningfully change (span of one rate, or capped at
    /// 60 Hz or below) makes flicker voting pointless.
    pub fn on_refresh_rate_range_changed(&self, min: f32, max: f32) {
        self.gating_changed(|state| {
            state.rate_min = min;
            state.rate_max = max;
        });
    }

    fn gating_changed(&self, mutate: impl FnOnce(&mut ZoneState)) {
        let (update, hook_calls) = {
            let mut state = self.state.lock().expect("zone state lock poisoned");
            mutate(&mut state);
            let hook_calls = self.update_observation(&mut state);
            let update = self.evaluate(&mut state);
            (update, hook_calls)
        };
        if let Some((light, thermal)) = hook_calls {
            if !light {
                self.cancel_injector();
            }
            let hook = self.hook.lock().expect("hook lock poisoned").clone();
            if let Some(hook) = hook {
                hook.set_light_sensor_enabled(light);
                hook.set_thermal_updates_enabled(thermal);
            }
        }
        self.apply(update);
    }

    /// Recomputes what the classifier wants to observe. Returns the new
    /// (light, thermal) wants when either changed, for reporting to the
    /// hook outside the lock.
    fn update_observation(&self, state: &mut ZoneState) -> Option<(bool, bool)> {
        let light = self.config.observes_ambient_light() && state.voting_allowed();
        let thermal = light && self.has_thermal_ranges();
        if light == state.observing_light && thermal == state.observing_thermal {
            return None;
        }

        if light != state.observing_light {
            debug!(observing = light, "light sensor observation changed");
            state.observing_light = light;
            if !light {
                state.filter.clear();
                state.raw_lux = None;
                state.smoothed_lux = None;
            }
        }
        if thermal != state.observing_thermal {
            state.observing_thermal = thermal;
            if !thermal {
                // No more updates will arrive; stale severity must not keep
                // narrowing the zone votes.
                state.thermal = ThermalSeverity::None;
            }
        }
        Some((light, thermal))
    }

    fn has_thermal_ranges(&self) -> bool {
        (self.config.low_zone_enabled() && !self.config.low_zone_thermal_ranges.is_empty())
            || (self.config.high_zone_enabled()
                && !self.config.high_zone_thermal_ranges.is_empty())
    }

    /// Classifies the current state into a zone and returns the vote pair
    /// to apply once the lock is released.
    fn evaluate(&self, state: &mut ZoneState) -> VoteUpdate {
        if !state.voting_allowed() {
            if state.zone != Zone::None {
                debug!(from = ?state.zone, "leaving flicker zone, voting gated off");
                state.zone = Zone::None;
            }
            return VoteUpdate::CLEAR;
        }

        let low = self.config.low_zone_enabled()
            && in_zone(
                state.brightness,
                state.smoothed_lux,
                &self.config.low_display_thresholds,
                &self.config.low_ambient_thresholds,
                |value, threshold| value <= threshold,
            );
        let high = self.config.high_zone_enabled()
            && in_zone(
                state.brightness,
                state.smoothed_lux,
                &self.config.high_display_thresholds,
                &self.config.high_ambient_thresholds,
                |value, threshold| value >= threshold,
            );
        if low && high {
            warn!(
                brightness = ?state.brightness,
                lux = ?state.smoothed_lux,
                "low and high flicker zones active simultaneously; \
                 thresholds likely overlap, high zone wins"
            );
        }

        let zone = if high {
            Zone::High
        } else if low {
            Zone::Low
        } else {
            Zone::None
        };
        if zone != state.zone {
            debug!(from = ?state.zone, to = ?zone, "flicker zone changed");
            state.zone = zone;
        }

        match zone {
            Zone::None => VoteUpdate::CLEAR,
            Zone::Low => self.zone_votes(
                self.config.low_zone_refresh_rate,
                self.config
                    .low_zone_thermal_ranges
                    .best_matching_range(state.thermal),
            ),
            Zone::High => self.zone_votes(
                self.config.high_zone_refresh_rate,
                self.config
                    .high_zone_thermal_ranges
                    .best_matching_range(state.thermal),
            ),
        }
    }

    fn zone_votes(&self, rate: f32, thermal_range: Option<RefreshRateRange>) -> VoteUpdate {
        let range = thermal_range.unwrap_or(RefreshRateRange::new(rate, rate));
        VoteUpdate {
            rate: Some(Vote::for_physical_rates(range.min, range.max)),
            switching: Some(Vote::for_disable_mode_switching()),
        }
    }

    fn apply(&self, update: VoteUpdate) {
        self.storage.set_vote(None, Priority::FlickerRate, update.rate);
        self.storage.set_vote(None, Priority::FlickerSwitching, update.switching);
    }

    /// A raw reading that crosses a zone boundary towards the zone (lower
    /// for the low zone, higher for the high zone) relative to the current
    /// estimate.
    fn crossed_entering(&self, raw: f32, current: f32) -> bool {
        (raw < current
            && crosses_boundary(raw, current, &self.config.low_ambient_thresholds))
            || (raw > current
                && crosses_boundary(raw, current, &self.config.high_ambient_thresholds))
    }

    fn raw_smoothed_disagree(&self, state: &ZoneState) -> bool {
        match (state.raw_lux, state.smoothed_lux) {
            (Some(raw), Some(smoothed)) => {
                crosses_boundary(raw, smoothed, &self.config.low_ambient_thresholds)
                    || crosses_boundary(raw, smoothed, &self.config.high_ambient_thresholds)
            }
            _ => false,
        }
    }

    /// Spawns the boundary re-injection timer: while the sensor is quiet,
    /// re-feed the last raw reading at the sensor cadence so the smoothed
    /// estimate keeps converging and the zone vote eventually follows.
    fn arm_injector(self: &Arc<Self>) {
        let Ok(handle) = Handle::try_current() else {
            // No runtime; the estimate will catch up on the next real sample.
            return;
        };
        let weak: Weak<Self> = Arc::downgrade(self);
        let task = handle.spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(LIGHT_SENSOR_RATE_MS)).await;
                let Some(classifier) = weak.upgrade() else { break };
                if classifier.inject_sensor_value() {
                    break;
                }
            }
        });
        let mut slot = self.injector.lock().expect("injector lock poisoned");
        if let Some(old) = slot.replace(task) {
            old.abort();
        }
    }

    fn cancel_injector(&self) {
        if let Some(task) = self.injector.lock().expect("injector lock poisoned").take() {
            task.abort();
        }
    }

    /// One timer tick: re-feed the last raw value and re-evaluate. Returns
    /// true once raw and smoothed agree (or injection stopped making sense)
    /// so the timer can disarm.
    fn inject_sensor_value(&self) -> bool {
        let (update, settled) = {
            let mut state = self.state.lock().expect("zone state lock poisoned");
            let Some(raw) = state.raw_lux else { return true };
            if !state.observing_light {
                return true;
            }
            let timestamp_ms = state.last_timestamp_ms + LIGHT_SENSOR_RATE_MS;
            state.last_timestamp_ms = timestamp_ms;
            state.filter.add_value(timestamp_ms, raw);
            state.smoothed_lux = state.filter.estimate(timestamp_ms);
            let update = self.evaluate(&mut state);
            (update, !self.raw_smoothed_disagree(&state))
        };
        self.apply(update);
        settled
    }
}

impl Drop for BrightnessZoneClassifier {
    fn drop(&mut self) {
        self.cancel_injector();
    }
}

/// Zone membership for one threshold pairing. A pair gates on whichever of
/// its dimensions is set (non-negative); a fully unset pair never matches.
fn in_zone(
    brightness: Option<f32>,
    lux: Option<f32>,
    display_thresholds: &[f32],
    ambient_thresholds: &[f32],
    inside: impl Fn(f32, f32) -> bool,
) -> bool {
    for (&disp, &ambi) in display_thresholds.iter().zip(ambient_thresholds) {
        let disp_ok = disp < 0.0 || brightness.map(|b| inside(b, disp)).unwrap_or(false);
        let ambi_ok = ambi < 0.0 || lux.map(|l| inside(l, ambi)).unwrap_or(false);
        // At least one dimension must be set and satisfied.
        let any_set = disp >= 0.0 || ambi >= 0.0;
        if any_set && disp_ok && ambi_ok {
            return true;
        }
    }
    false
}

/// Whether `a` and `b` sit on different sides of any threshold.
fn crosses_boundary(a: f32, b: f32, thresholds: &[f32]) -> bool {
    thresholds
        .iter()
        .filter(|t| **t >= 0.0)
        .any(|&t| (a <= t) != (b <= t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn low_zone_config() -> BlockingZoneConfig {
        BlockingZoneConfig {
            low_display_thresholds: vec![5.0],
            low_ambient_thresholds: vec![10.0],
            low_zone_refresh_rate: 60.0,
            ..Default::default()
        }
    }

    fn both_zones_config() -> BlockingZoneConfig {
        BlockingZoneConfig {
            high_display_thresholds: vec![400.0],
            high_ambient_thresholds: vec![8000.0],
            high_zone_refresh_rate: 120.0,
            ..low_zone_config()
        }
    }

    fn classifier_with(config: BlockingZoneConfig) -> (Arc<VoteStorage>, Arc<BrightnessZoneClassifier>) {
        let storage = Arc::new(VoteStorage::new());
        let classifier = BrightnessZoneClassifier::new(Arc::clone(&storage), config);
        // Make the refresh rate range changeable so voting is not gated off.
        classifier.on_refresh_rate_range_changed(60.0, 120.0);
        (storage, classifier)
    }

    fn flicker_votes(storage: &VoteStorage) -> (Option<Vote>, Option<Vote>) {
        (
            storage.get_vote(0, Priority::FlickerRate),
            storage.get_vote(0, Priority::FlickerSwitching),
        )
    }

    #[test]
    fn test_dim_display_in_dim_room_pins_low_zone_rate() {
        let (storage, classifier) = classifier_with(low_zone_config());
        classifier.on_brightness_changed(2.0);
        classifier.on_ambient_lux(0, 3.0);

        let (rate, switching) = flicker_votes(&storage);
        assert_eq!(rate, Some(Vote::for_physical_rates(60.0, 60.0)));
        assert_eq!(switching, Some(Vote::for_disable_mode_switching()));
    }

    #[test]
    fn test_bright_conditions_assert_no_votes() {
        let (storage, classifier) = classifier_with(low_zone_config());
        classifier.on_brightness_changed(200.0);
        classifier.on_ambient_lux(0, 500.0);
        assert_eq!(flicker_votes(&storage), (None, None));
    }

    #[test]
    fn test_leaving_zone_withdraws_votes() {
        let (storage, classifier) = classifier_with(low_zone_config());
        classifier.on_brightness_changed(2.0);
        classifier.on_ambient_lux(0, 3.0);
        assert!(flicker_votes(&storage).0.is_some());

        classifier.on_brightness_changed(300.0);
        assert_eq!(flicker_votes(&storage), (None, None));
    }

    #[test]
    fn test_zone_entry_is_immediate_and_exit_is_smoothed() {
        let (storage, classifier) = classifier_with(low_zone_config());
        classifier.on_brightness_changed(2.0);

        // Bright for a while: no zone.
        classifier.on_ambient_lux(0, 100.0);
        assert!(flicker_votes(&storage).0.is_none());

        // Entering crossing clears the filter, so one dark sample is enough.
        classifier.on_ambient_lux(1_000, 5.0);
        assert!(flicker_votes(&storage).0.is_some());

        // One bright sample barely moves the smoothed estimate: still in zone.
        classifier.on_ambient_lux(2_000, 100.0);
        assert!(flicker_votes(&storage).0.is_some());

        // By now the estimate has decayed above the boundary, so the dark
        // sample is an entering crossing again and takes effect immediately.
        classifier.on_ambient_lux(3_000, 5.0);
        assert!(flicker_votes(&storage).0.is_some());
    }

    #[test]
    fn test_high_zone_wins_when_thresholds_overlap() {
        let config = BlockingZoneConfig {
            low_display_thresholds: vec![500.0],
            low_ambient_thresholds: vec![-1.0],
            low_zone_refresh_rate: 60.0,
            high_display_thresholds: vec![400.0],
            high_ambient_thresholds: vec![-1.0],
            high_zone_refresh_rate: 120.0,
            ..Default::default()
        };
        let (storage, classifier) = classifier_with(config);
        // 450 nits is below the low threshold and above the high one.
        classifier.on_brightness_changed(450.0);

        let (rate, _) = flicker_votes(&storage);
        assert_eq!(rate, Some(Vote::for_physical_rates(120.0, 120.0)));
    }

    #[test]
    fn test_unset_ambient_threshold_gates_on_brightness_alone() {
        let config = BlockingZoneConfig {
            low_display_thresholds: vec![5.0],
            low_ambient_thresholds: vec![-1.0],
            low_zone_refresh_rate: 60.0,
            // The high zone still watches ambient light, keeping the sensor on.
            high_display_thresholds: vec![400.0],
            high_ambient_thresholds: vec![8000.0],
            high_zone_refresh_rate: 120.0,
            ..Default::default()
        };
        let (storage, classifier) = classifier_with(config);
        classifier.on_brightness_changed(2.0);
        assert!(flicker_votes(&storage).0.is_some());
    }

    #[test]
    fn test_thermal_pressure_swaps_pinned_rate_for_range() {
        let mut config = low_zone_config();
        let mut ranges = std::collections::BTreeMap::new();
        ranges.insert(ThermalSeverity::Severe, RefreshRateRange::new(60.0, 90.0));
        config.low_zone_thermal_ranges = crate::thermal::ThermalRateMap::new(ranges);

        let (storage, classifier) = classifier_with(config);
        classifier.on_brightness_changed(2.0);
        classifier.on_ambient_lux(0, 3.0);
        assert_eq!(
            flicker_votes(&storage).0,
            Some(Vote::for_physical_rates(60.0, 60.0))
        );

        classifier.on_thermal_status(ThermalSeverity::Severe);
        assert_eq!(
            flicker_votes(&storage).0,
            Some(Vote::for_physical_rates(60.0, 90.0))
        );

        classifier.on_thermal_status(ThermalSeverity::Light);
        assert_eq!(
            flicker_votes(&storage).0,
            Some(Vote::for_physical_rates(60.0, 60.0))
        );
    }

    #[test]
    fn test_low_power_mode_force_clears_votes() {
        let (storage, classifier) = classifier_with(low_zone_config());
        classifier.on_brightness_changed(2.0);
        classifier.on_ambient_lux(0, 3.0);
        assert!(flicker_votes(&storage).0.is_some());

        classifier.on_low_power_mode(true);
        assert_eq!(flicker_votes(&storage), (None, None));
    }

    #[test]
    fn test_display_off_clears_votes() {
        let (storage, classifier) = classifier_with(low_zone_config());
        classifier.on_brightness_changed(2.0);
        classifier.on_ambient_lux(0, 3.0);
        assert!(flicker_votes(&storage).0.is_some());

        classifier.on_display_state_changed(false);
        assert_eq!(flicker_votes(&storage), (None, None));
    }

    #[test]
    fn test_unchangeable_rate_range_never_votes() {
        let storage = Arc::new(VoteStorage::new());
        let classifier = BrightnessZoneClassifier::new(Arc::clone(&storage), low_zone_config());
        classifier.on_refresh_rate_range_changed(60.0, 60.0);

        classifier.on_brightness_changed(2.0);
        classifier.on_ambient_lux(0, 3.0);
        assert_eq!(flicker_votes(&storage), (None, None));
    }

    #[test]
    fn test_sensor_hook_follows_gating() {
        struct RecordingHook {
            light: AtomicBool,
        }
        impl LightSensorHook for RecordingHook {
            fn set_light_sensor_enabled(&self, enabled: bool) {
                self.light.store(enabled, Ordering::SeqCst);
            }
        }

        let (_storage, classifier) = classifier_with(low_zone_config());
        let hook = Arc::new(RecordingHook { light: AtomicBool::new(false) });
        classifier.set_sensor_hook(Some(Arc::clone(&hook) as Arc<dyn LightSensorHook>));
        assert!(hook.light.load(Ordering::SeqCst));

        classifier.on_low_power_mode(true);
        assert!(!hook.light.load(Ordering::SeqCst));

        classifier.on_low_power_mode(false);
        assert!(hook.light.load(Ordering::SeqCst));
    }

    #[test]
    fn test_losing_thermal_observation_resets_severity() {
        let mut config = low_zone_config();
        let mut ranges = std::collections::BTreeMap::new();
        ranges.insert(ThermalSeverity::Severe, RefreshRateRange::new(60.0, 90.0));
        config.low_zone_thermal_ranges = crate::thermal::ThermalRateMap::new(ranges);

        let (storage, classifier) = classifier_with(config);
        classifier.on_brightness_changed(2.0);
        classifier.on_ambient_lux(0, 3.0);
        classifier.on_thermal_status(ThermalSeverity::Severe);
        assert_eq!(
            flicker_votes(&storage).0,
            Some(Vote::for_physical_rates(60.0, 90.0))
        );

        // Gating off drops thermal observation; coming back must not reuse
        // the stale severity.
        classifier.on_display_state_changed(false);
        classifier.on_display_state_changed(true);
        classifier.on_brightness_changed(2.0);
        // The lux estimate was dropped with the sensor, but brightness alone
        // cannot re-enter this config's zone, so feed a fresh sample.
        classifier.on_ambient_lux(10_000, 3.0);
        assert_eq!(
            flicker_votes(&storage).0,
            Some(Vote::for_physical_rates(60.0, 60.0))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_boundary_timer_converges_estimate_after_sensor_goes_quiet() {
        let (storage, classifier) = classifier_with(low_zone_config());
        classifier.on_brightness_changed(2.0);
        classifier.on_ambient_lux(0, 100.0);
        classifier.on_ambient_lux(1_000, 5.0);
        assert!(flicker_votes(&storage).0.is_some());

        // A bright reading arrives and the sensor goes quiet. The smoothed
        // estimate still sits below the boundary, so the zone holds at first.
        classifier.on_ambient_lux(2_000, 100.0);
        assert!(flicker_votes(&storage).0.is_some());

        // Injected re-polls keep feeding the last raw value until the
        // estimate crosses the boundary and the vote is withdrawn.
        tokio::time::sleep(Duration::from_secs(15)).await;
        assert!(flicker_votes(&storage).0.is_none());
    }
}
