//! Vote storage: the shared table of active constraints.
//!
//! Holds at most one vote per (display, priority) pair, plus a global table
//! applied to every display. All mutation goes through [`VoteStorage::set_vote`],
//! which replaces or clears atomically and schedules a single debounced
//! change notification per burst.

use crate::mode::DisplayId;
use crate::notifier::{ChangeListener, DebouncedNotifier};
use crate::vote::{Priority, Vote};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use tracing::debug;

#[derive(Default)]
struct Tables {
    /// Per-display votes, keyed by priority.
    by_display: HashMap<DisplayId, BTreeMap<Priority, Vote>>,
    /// Votes applied to every display.
    global: BTreeMap<Priority, Vote>,
}

/// Shared storage of all active votes.
///
/// Operations are total: clearing an absent vote or snapshotting an unknown
/// display is not an error. Producers hold no reference to a vote after
/// submission; replacement is whole-value, so readers never observe a
/// half-written vote.
pub struct VoteStorage {
    tables: Mutex<Tables>,
    notifier: DebouncedNotifier,
}

impl VoteStorage {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            notifier: DebouncedNotifier::new(),
        }
    }

    /// Registers the listener invoked (debounced, off-lock) after mutations.
    pub fn set_listener(&self, listener: Option<ChangeListener>) {
        self.notifier.set_listener(listener);
    }

    /// Sets, replaces, or clears (`vote = None`) the vote at the given
    /// priority. `display = None` addresses the global table applied to all
    /// displays.
    pub fn set_vote(&self, display: Option<DisplayId>, priority: Priority, vote: Option<Vote>) {
        // `tracing` macros import `field::display` inside their expansion,
        // which shadows a local named `display`; log through an alias.
        let display_id = display;
        let changed = {
            let mut tables = self.tables.lock().expect("vote storage lock poisoned");
            let table = match display {
                Some(id) => tables.by_display.entry(id).or_default(),
                None => &mut tables.global,
            };
            match vote {
                Some(vote) => {
                    let changed = table.get(&priority) != Some(&vote);
                    if changed {
                        debug!(display = ?display_id, ?priority, ?vote, "vote set");
                        table.insert(priority, vote);
                    }
                    changed
                }
                None => {
                    let removed = table.remove(&priority).is_some();
                    if removed {
                        debug!(display = ?display_id, ?priority, "vote cleared");
                    }
                    removed
                }
            }
        };

        if changed {
            self.notifier.notify();
        }
    }

    /// Merged view of the votes applying to `display`: the global table with
    /// per-display entries taking precedence at equal priority. Returns an
    /// owned map so callers never hold the storage lock during resolution.
    pub fn snapshot(&self, display: DisplayId) -> BTreeMap<Priority, Vote> {
        let tables = self.tables.lock().expect("vote storage lock poisoned");
        let mut merged = tables.global.clone();
        if let Some(table) = tables.by_display.get(&display) {
            for (priority, vote) in table {
                merged.insert(*priority, vote.clone());
            }
        }
        merged
    }

    /// Signals a change originating outside the vote tables (mode list or
    /// policy updates) through the same coalescing window.
    pub(crate) fn notify_external_change(&self) {
        self.notifier.notify();
    }

    /// The vote at one (display, priority) slot, for diagnostics and tests.
    pub fn get_vote(&self, display: DisplayId, priority: Priority) -> Option<Vote> {
        self.snapshot(display).remove(&priority)
    }
}

impl Default for VoteStorage {
    fn default() -> Self {
        Self::new()
    }
}
