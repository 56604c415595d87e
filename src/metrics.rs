use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;

/// Process-wide collection metrics.
///
/// Purpose:
/// - Track collectors started
/// - Track capability calls and collection runs seen
/// - Track stored expenses and consolidations
///
/// Lock-free (Atomics), safe to update from any task.
#[derive(Default)]
pub struct RuntimeMetrics {
    pub collectors_started: AtomicUsize,
    pub capability_calls: AtomicUsize,
    pub runs_seen: AtomicUsize,
    pub expenses_stored: AtomicUsize,
    pub consolidations: AtomicUsize,
}

impl RuntimeMetrics {
    /// One-line summary, logged at the end of a `collect` invocation.
    pub fn summary(&self) -> String {
        format!(
            "[METRICS] collectors={} calls={} runs={} expenses={} consolidations={}",
            self.collectors_started.load(Ordering::Relaxed),
            self.capability_calls.load(Ordering::Relaxed),
            self.runs_seen.load(Ordering::Relaxed),
            self.expenses_stored.load(Ordering::Relaxed),
            self.consolidations.load(Ordering::Relaxed),
        )
    }
}

/// Global metrics registry (singleton)
pub static METRICS: Lazy<Arc<RuntimeMetrics>> =
    Lazy::new(|| Arc::new(RuntimeMetrics::default()));
