// src/infra/clock.rs — Millisecond clock seam

use chrono::Utc;

/// Source of "now" in milliseconds since the Unix epoch.
///
/// The analytics tracker and the profile cache derive durations and
/// staleness from this; tests inject a manual implementation.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Wall-clock implementation used everywhere outside tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}
