//! Clock utilities for the HORUS runtime.
//!
//! Two clocks exist side by side and must not be mixed:
//!
//! - The **monotonic clock** ([`monotonic_ns`], [`sleep_until`]) drives the
//!   scheduler and node timing. Its epoch is the first time any HORUS clock
//!   function runs in the process.
//! - The **wall clock** ([`timestamp_now`]) is used only for the `timestamp`
//!   field of message records.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use lazy_static::lazy_static;

lazy_static! {
    static ref PROCESS_START: Instant = Instant::now();
}

/// Nanoseconds elapsed since the process clock epoch (monotonic).
#[inline]
pub fn monotonic_ns() -> u64 {
    PROCESS_START.elapsed().as_nanos() as u64
}

/// The process clock epoch. Forcing it early pins tick 0 near process start.
#[inline]
pub fn process_start() -> Instant {
    *PROCESS_START
}

/// Wall-clock nanoseconds since the Unix epoch.
///
/// Message timestamps only. Scheduling decisions never use this clock.
#[inline]
pub fn timestamp_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

/// Sleep until `deadline` on the monotonic clock.
///
/// Returns immediately if the deadline has already passed. Re-checks after
/// waking so an early wakeup never returns before the deadline.
pub fn sleep_until(deadline: Instant) {
    loop {
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        std::thread::sleep(deadline - now);
    }
}

/// Sleep for a fixed number of milliseconds.
pub fn sleep_ms(ms: u64) {
    std::thread::sleep(Duration::from_millis(ms));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_ns_increases() {
        let a = monotonic_ns();
        std::thread::sleep(Duration::from_millis(2));
        let b = monotonic_ns();
        assert!(b > a);
    }

    #[test]
    fn test_timestamp_now_is_wall_clock() {
        // Any plausible wall clock is past 2020-01-01 in nanoseconds.
        assert!(timestamp_now() > 1_577_836_800_000_000_000);
    }

    #[test]
    fn test_sleep_until_honors_deadline() {
        let deadline = Instant::now() + Duration::from_millis(20);
        sleep_until(deadline);
        assert!(Instant::now() >= deadline);
    }

    #[test]
    fn test_sleep_until_past_deadline_returns_immediately() {
        let deadline = Instant::now() - Duration::from_millis(5);
        let t0 = Instant::now();
        sleep_until(deadline);
        assert!(t0.elapsed() < Duration::from_millis(5));
    }
}
