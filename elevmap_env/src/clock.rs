//! Timing abstraction: a monotonic clock for timestamps plus an RAII
//! `Timer` for profiling long operations like `fuse_area`.

use std::time::{Duration, Instant};

use tracing::trace;

/// Abstracts wall/monotonic time so the engine loop can be driven by a
/// deterministic clock under test without touching `elevmap_core`.
pub trait Clock: Send + Sync {
    /// Monotonic time in nanoseconds since an arbitrary epoch, used to
    /// stamp inbound point clouds and propagation deltas.
    fn now_nanos(&self) -> u64;
}

/// Production clock backed by `std::time::Instant`.
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_nanos(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }
}

/// RAII guard that logs elapsed time at `trace` level on drop. Used to
/// time `fuse_area` calls without threading a stopwatch through call
/// sites.
pub struct Timer {
    label: &'static str,
    start: Instant,
}

impl Timer {
    pub fn start(label: &'static str) -> Self {
        Self { label, start: Instant::now() }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        trace!(label = self.label, elapsed_us = self.elapsed().as_micros() as u64, "timer");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_monotonic() {
        let clock = SystemClock::new();
        let t1 = clock.now_nanos();
        std::thread::sleep(Duration::from_millis(1));
        let t2 = clock.now_nanos();
        assert!(t2 > t1);
    }

    #[test]
    fn timer_reports_nonzero_elapsed() {
        let timer = Timer::start("test");
        std::thread::sleep(Duration::from_millis(1));
        assert!(timer.elapsed() >= Duration::from_millis(1));
    }
}
