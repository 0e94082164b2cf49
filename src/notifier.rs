//! Debounced change notification.
//!
//! Vote mutations arrive in bursts (a settings change fans out into several
//! votes), and listeners both observe the arbiter and call back into it. The
//! notifier coalesces a burst into a single callback and delivers it from a
//! spawned task so the listener is never invoked while a lock is held.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// Callback invoked when the resolved output may have changed.
pub type ChangeListener = Arc<dyn Fn() + Send + Sync>;

/// Debounce window for coalescing vote mutation bursts.
const DEBOUNCE: Duration = Duration::from_millis(16);

/// Coalesces change signals and posts the listener callback off-lock.
///
/// When called inside a tokio runtime the callback is delivered from a
/// spawned task after the debounce window; further signals arriving before
/// the task fires collapse into that one delivery. Outside a runtime the
/// callback is delivered synchronously, which keeps purely synchronous
/// embedders and unit tests working at the cost of the deferral.
pub struct DebouncedNotifier {
    listener: Mutex<Option<ChangeListener>>,
    pending: Arc<AtomicBool>,
}

impl DebouncedNotifier {
    pub fn new() -> Self {
        Self {
            listener: Mutex::new(None),
            pending: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Registers the listener, replacing any previous one.
    pub fn set_listener(&self, listener: Option<ChangeListener>) {
        let mut guard = self.listener.lock().expect("notifier lock poisoned");
        *guard = listener;
    }

    /// Signals that the resolved output may have changed. At most one
    /// callback is delivered per coalescing window.
    pub fn notify(&self) {
        if self.pending.swap(true, Ordering::AcqRel) {
            // A delivery is already scheduled; this signal rides along.
            return;
        }

        let listener = {
            let guard = self.listener.lock().expect("notifier lock poisoned");
            guard.clone()
        };
        let Some(listener) = listener else {
            self.pending.store(false, Ordering::Release);
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let pending = Arc::clone(&self.pending);
                handle.spawn(async move {
                    tokio::time::sleep(DEBOUNCE).await;
                    pending.store(false, Ordering::Release);
                    listener();
                });
            }
            Err(_) => {
                debug!("no async runtime, delivering change notification inline");
                self.pending.store(false, Ordering::Release);
                listener();
            }
        }
    }
}

impl Default for DebouncedNotifier {
    fn default() -> Self {
        Self::new()
    }
}
