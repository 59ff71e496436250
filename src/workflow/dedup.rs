//! Best-effort suppression of duplicate webhook deliveries. The cache
//! is process-local, so a multi-instance deployment may still process
//! the same thread twice; the label operations are idempotent, this
//! only saves redundant API calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;

const DEDUP_WINDOW_MS: i64 = 5_000;
const GC_THRESHOLD: usize = 100;

/// Time source, injected so tests can drive it manually.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

pub struct DedupCache {
    entries: Mutex<HashMap<String, i64>>,
    window_ms: i64,
    gc_threshold: usize,
    clock: Arc<dyn Clock>,
}

impl DedupCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_window(DEDUP_WINDOW_MS, GC_THRESHOLD, clock)
    }

    pub fn with_window(window_ms: i64, gc_threshold: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            window_ms,
            gc_threshold,
            clock,
        }
    }

    /// Returns true when `key` was seen within the window. Otherwise
    /// records it as seen now. Check and record happen under a single
    /// lock acquisition so concurrent requests cannot both pass.
    pub fn was_recently_processed(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        let mut entries = self.entries.lock().unwrap();

        if let Some(&last_seen) = entries.get(key) {
            if now - last_seen < self.window_ms {
                return true;
            }
        }
        entries.insert(key.to_string(), now);

        if entries.len() > self.gc_threshold {
            let window_ms = self.window_ms;
            entries.retain(|_, &mut last_seen| now - last_seen < window_ms);
        }
        false
    }
}
