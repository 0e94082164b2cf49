//! Temporal smoothing of ambient light samples.
//!
//! Raw lux readings are noisy; the classifier smooths them with a rolling
//! time-weighted average so zone membership doesn't oscillate near a
//! boundary. The filter history can be cleared for an immediate response
//! when a sample crosses into a risk zone.

use std::collections::VecDeque;

/// How far back samples contribute to the estimate.
const DEFAULT_HORIZON_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy)]
struct Sample {
    timestamp_ms: u64,
    lux: f32,
}

/// Rolling time-weighted average over a fixed horizon.
///
/// Each sample is weighted by the time it was the latest reading, so a brief
/// spike contributes little while a sustained level dominates the estimate.
#[derive(Debug)]
pub struct AmbientFilter {
    horizon_ms: u64,
    samples: VecDeque<Sample>,
}

impl AmbientFilter {
    pub fn new() -> Self {
        Self::with_horizon(DEFAULT_HORIZON_MS)
    }

    pub fn with_horizon(horizon_ms: u64) -> Self {
        Self {
            horizon_ms,
            samples: VecDeque::new(),
        }
    }

    /// Inserts a new sample. Out-of-order timestamps are clamped forward;
    /// sensor drivers occasionally deliver equal timestamps on wakeup.
    pub fn add_value(&mut self, timestamp_ms: u64, lux: f32) {
        let timestamp_ms = match self.samples.back() {
            Some(last) => timestamp_ms.max(last.timestamp_ms),
            None => timestamp_ms,
        };
        self.samples.push_back(Sample { timestamp_ms, lux });
        self.prune(timestamp_ms);
    }

    /// The smoothed estimate at `now_ms`, or `None` when no sample has been
    /// observed since the last clear.
    pub fn estimate(&self, now_ms: u64) -> Option<f32> {
        let newest = self.samples.back()?;
        let now_ms = now_ms.max(newest.timestamp_ms);
        let window_start = now_ms.saturating_sub(self.horizon_ms);

        let mut weighted_sum = 0.0f64;
        let mut total_weight = 0.0f64;
        for (i, sample) in self.samples.iter().enumerate() {
            let start = sample.timestamp_ms.max(window_start);
            let end = match self.samples.get(i + 1) {
                Some(next) => next.timestamp_ms,
                None => now_ms,
            };
            let weight = end.saturating_sub(start) as f64;
            weighted_sum += sample.lux as f64 * weight;
            total_weight += weight;
        }

        if total_weight > 0.0 {
            Some((weighted_sum / total_weight) as f32)
        } else {
            // All samples share one instant; fall back to the newest reading.
            Some(newest.lux)
        }
    }

    /// Forgets all history. The next sample alone defines the estimate,
    /// which is how the classifier gets an immediate reaction when entering
    /// a risk zone.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    fn prune(&mut self, now_ms: u64) {
        let window_start = now_ms.saturating_sub(self.horizon_ms);
        // Keep the last sample that started before the window; it still
        // covers the window's leading edge.
        while let Some(second) = self.samples.get(1) {
            if second.timestamp_ms <= window_start {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }
}

impl Default for AmbientFilter {
    fn default() -> Self {
        Self::new()
    }
}
