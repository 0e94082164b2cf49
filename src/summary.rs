//! Vote summarization: folding a priority band of votes into one constraint
//! set, filtering supported modes against it, and selecting the base mode.
//!
//! A summary is a scratch accumulator scoped to one resolution pass; it is
//! rebuilt from the vote snapshot on every relaxation step and never
//! persisted.

use crate::mode::Mode;
use crate::vote::{rates_equal, Priority, RefreshRateRange, Vote, FLOAT_TOLERANCE};
use std::collections::BTreeMap;
use tracing::trace;

/// Running intersection of every constraint in a priority band.
///
/// Ranges that never receive a vote stay unconstrained, so an empty band
/// admits every supported mode.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteSummary {
    pub min_physical_rate: f32,
    pub max_physical_rate: f32,
    pub min_render_rate: f32,
    pub max_render_rate: f32,
    pub min_width: u32,
    pub min_height: u32,
    pub max_width: u32,
    pub max_height: u32,
    /// Preferred base mode rate from the highest-priority vote carrying one.
    pub base_mode_rate: Option<f32>,
    pub disable_mode_switching: bool,
    pub disable_render_switching: bool,
}

impl VoteSummary {
    pub fn new() -> Self {
        Self {
            min_physical_rate: 0.0,
            max_physical_rate: f32::INFINITY,
            min_render_rate: 0.0,
            max_render_rate: f32::INFINITY,
            min_width: 0,
            min_height: 0,
            max_width: u32::MAX,
            max_height: u32::MAX,
            base_mode_rate: None,
            disable_mode_switching: false,
            disable_render_switching: false,
        }
    }

    /// Resets and folds in every vote whose priority lies in `[low, high]`,
    /// highest priority first.
    pub fn apply_votes(
        &mut self,
        votes: &BTreeMap<Priority, Vote>,
        low: Priority,
        high: Priority,
    ) {
        *self = Self::new();
        for (priority, vote) in votes.range(low..=high).rev() {
            if let Some(range) = vote.physical_rate_range {
                self.min_physical_rate = self.min_physical_rate.max(range.min);
                self.max_physical_rate = self.max_physical_rate.min(range.max);
            }
            if let Some(range) = vote.render_rate_range {
                self.min_render_rate = self.min_render_rate.max(range.min);
                self.max_render_rate = self.max_render_rate.min(range.max);
            }
            if let Some(size) = vote.size {
                self.min_width = self.min_width.max(size.min_width);
                self.min_height = self.min_height.max(size.min_height);
                self.max_width = self.max_width.min(size.max_width);
                self.max_height = self.max_height.min(size.max_height);
            }
            if self.base_mode_rate.is_none() {
                // Highest-priority preference wins; we iterate descending.
                self.base_mode_rate = vote.base_mode_rate;
            }
            self.disable_mode_switching |= vote.disable_mode_switching;
            self.disable_render_switching |= vote.disable_render_switching;
            trace!(?priority, summary = ?self, "vote folded");
        }
    }

    /// Widens the size bounds to include the default mode's resolution, so
    /// the candidate set is never emptied by size votes alone. Switching the
    /// panel away from its default resolution is disruptive; votes may narrow
    /// towards it but never exclude it.
    pub fn adjust_size(&mut self, default_mode: &Mode) {
        self.min_width = self.min_width.min(default_mode.width);
        self.min_height = self.min_height.min(default_mode.height);
        self.max_width = self.max_width.max(default_mode.width);
        self.max_height = self.max_height.max(default_mode.height);
    }

    /// Filters `modes` down to those satisfying every bound in the summary.
    ///
    /// A mode is render-capable for the band when its physical rate reaches
    /// the minimum render rate; rendering below the physical rate is always
    /// possible, so the maximum render rate does not exclude modes. When mode
    /// switching is disabled, only the default mode's group remains eligible.
    pub fn filter_modes(&self, modes: &[Mode], default_mode: &Mode) -> Vec<Mode> {
        // Conflicting votes can invert a range; such a band admits nothing
        // and forces the caller to relax.
        if self.min_physical_rate > self.max_physical_rate + FLOAT_TOLERANCE
            || self.min_render_rate > self.max_render_rate + FLOAT_TOLERANCE
            || self.min_width > self.max_width
            || self.min_height > self.max_height
        {
            trace!(summary = ?self, "inverted range, band unsatisfiable");
            return Vec::new();
        }

        let mut available = Vec::new();
        for mode in modes {
            if mode.width < self.min_width
                || mode.width > self.max_width
                || mode.height < self.min_height
                || mode.height > self.max_height
            {
                trace!(mode = mode.id, "discarded: outside size bounds");
                continue;
            }
            if mode.refresh_rate < self.min_physical_rate - FLOAT_TOLERANCE
                || mode.refresh_rate > self.max_physical_rate + FLOAT_TOLERANCE
            {
                trace!(mode = mode.id, "discarded: outside physical rate range");
                continue;
            }
            if mode.refresh_rate < self.min_render_rate - FLOAT_TOLERANCE {
                trace!(mode = mode.id, "discarded: too slow for min render rate");
                continue;
            }
            if self.disable_mode_switching && mode.group != default_mode.group {
                trace!(mode = mode.id, "discarded: outside default group with switching disabled");
                continue;
            }
            available.push(*mode);
        }
        available
    }

    /// Picks the base mode among `candidates`.
    ///
    /// An app-requested base mode rate wins when a matching candidate exists
    /// (preferring the default group on ties). Otherwise the candidate from
    /// the default mode's group with the highest physical rate that does not
    /// exceed the render cap; a candidate faster than any frame the band
    /// allows to render would anchor a rate the display can never show.
    /// Returns `None` when no candidate satisfies grouping.
    pub fn select_base_mode(&self, candidates: &[Mode], default_mode: &Mode) -> Option<Mode> {
        if let Some(rate) = self.base_mode_rate {
            let matching = candidates
                .iter()
                .filter(|m| rates_equal(m.refresh_rate, rate));
            let preferred = matching
                .clone()
                .find(|m| m.group == default_mode.group)
                .or_else(|| matching.clone().next());
            if let Some(mode) = preferred {
                return Some(*mode);
            }
        }

        let in_group = candidates.iter().filter(|m| m.group == default_mode.group);
        let capped = in_group
            .clone()
            .filter(|m| m.refresh_rate <= self.max_render_rate + FLOAT_TOLERANCE)
            .max_by(|a, b| a.refresh_rate.total_cmp(&b.refresh_rate));
        capped
            .or_else(|| in_group.max_by(|a, b| a.refresh_rate.total_cmp(&b.refresh_rate)))
            .copied()
    }

    /// Widens this summary's rate ranges so neither is narrower than
    /// `primary`'s. The app-request ranges bound what a foreground app may
    /// additionally ask for; they must never be stricter than what the
    /// system already allows.
    pub fn limit_refresh_ranges(&mut self, primary: &VoteSummary) {
        self.min_physical_rate = self.min_physical_rate.min(primary.min_physical_rate);
        self.max_physical_rate = self.max_physical_rate.max(primary.max_physical_rate);
        self.min_render_rate = self.min_render_rate.min(primary.min_render_rate);
        self.max_render_rate = self.max_render_rate.max(primary.max_render_rate);
    }

    /// Collapses the physical range to a single rate.
    pub fn pin_physical_rate(&mut self, rate: f32) {
        self.min_physical_rate = rate;
        self.max_physical_rate = rate;
    }

    /// Collapses the render range to a single rate.
    pub fn pin_render_rate(&mut self, rate: f32) {
        self.min_render_rate = rate;
        self.max_render_rate = rate;
    }

    pub fn physical_range(&self) -> RefreshRateRange {
        RefreshRateRange::new(self.min_physical_rate, self.max_physical_rate)
    }

    pub fn render_range(&self) -> RefreshRateRange {
        RefreshRateRange::new(self.min_render_rate, self.max_render_rate)
    }
}

impl Default for VoteSummary {
    fn default() -> Self {
        Self::new()
    }
}
