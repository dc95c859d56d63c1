// ── Rate-limited logging ──
//
// The worker talks on every tick. On a camera that stays unreachable for
// days that adds up, so each severity level gets a fixed budget of
// messages; past it, calls are counted and dropped.

use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::Level;

pub const DEFAULT_LOG_THRESHOLD: u64 = 200;

const TARGET: &str = "camlay::overlay";

/// Per-level counting wrapper around `tracing`.
#[derive(Debug)]
pub struct RateLimitedLog {
    threshold: u64,
    // error, warn, info, debug, trace
    counts: [AtomicU64; 5],
}

impl Default for RateLimitedLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_THRESHOLD)
    }
}

impl RateLimitedLog {
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold,
            counts: Default::default(),
        }
    }

    /// Count the call, then forward `message` at `level` only while the
    /// level's count is still below the threshold.
    ///
    /// Returns `true` if the message was emitted.
    pub fn log(&self, level: Level, message: impl Display) -> bool {
        let count = self.counter(level).fetch_add(1, Ordering::Relaxed) + 1;
        if count >= self.threshold {
            return false;
        }

        match level {
            Level::ERROR => tracing::error!(target: TARGET, "{message}"),
            Level::WARN => tracing::warn!(target: TARGET, "{message}"),
            Level::INFO => tracing::info!(target: TARGET, "{message}"),
            Level::DEBUG => tracing::debug!(target: TARGET, "{message}"),
            _ => tracing::trace!(target: TARGET, "{message}"),
        }
        true
    }

    pub fn error(&self, message: impl Display) -> bool {
        self.log(Level::ERROR, message)
    }

    pub fn warn(&self, message: impl Display) -> bool {
        self.log(Level::WARN, message)
    }

    pub fn info(&self, message: impl Display) -> bool {
        self.log(Level::INFO, message)
    }

    /// Total calls at `level`, emitted or not.
    pub fn seen(&self, level: Level) -> u64 {
        self.counter(level).load(Ordering::Relaxed)
    }

    /// Calls at `level` that were dropped.
    pub fn suppressed(&self, level: Level) -> u64 {
        let seen = self.seen(level);
        match self.threshold {
            0 => seen,
            t => seen.saturating_sub(t - 1),
        }
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    fn counter(&self, level: Level) -> &AtomicU64 {
        let [error, warn, info, debug, trace] = &self.counts;
        match level {
            Level::ERROR => error,
            Level::WARN => warn,
            Level::INFO => info,
            Level::DEBUG => debug,
            _ => trace,
        }
    }
}
