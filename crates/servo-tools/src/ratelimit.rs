//! Rate-limited logging: collapse repeated warnings emitted every tick
//! (unknown joint names, stale commands, unbounded joints) down to one
//! every ~30 seconds per distinct key.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug)]
pub struct RateLimitedLog {
    interval: Duration,
    last_logged: Mutex<HashMap<&'static str, Instant>>,
}

impl Default for RateLimitedLog {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

impl RateLimitedLog {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_logged: Mutex::new(HashMap::new()),
        }
    }

    fn should_log(&self, key: &'static str) -> bool {
        let now = Instant::now();
        let mut last_logged = self.last_logged.lock().unwrap_or_else(|e| e.into_inner());
        match last_logged.get(key) {
            Some(last) if now.duration_since(*last) < self.interval => false,
            _ => {
                last_logged.insert(key, now);
                true
            }
        }
    }

    pub fn warn(&self, key: &'static str, message: impl AsRef<str>) {
        if self.should_log(key) {
            tracing::warn!(key, "{}", message.as_ref());
        }
    }

    pub fn info(&self, key: &'static str, message: impl AsRef<str>) {
        if self.should_log(key) {
            tracing::info!(key, "{}", message.as_ref());
        }
    }
}
