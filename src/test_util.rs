//! Small helpers for the thread-choreography tests.

use std::thread;
use std::time::{Duration, Instant};

use crossbeam::utils::Backoff;

/// How long a cross-thread condition may take before a test gives up.
const PATIENCE: Duration = Duration::from_secs(5);

/// Spins, then yields, until `probe` returns true, panicking once
/// [`PATIENCE`] runs out. For asserting state another thread reaches
/// without assuming how fast it gets there.
pub(crate) fn eventually(probe: impl Fn() -> bool) {
    let backoff = Backoff::new();
    let start = Instant::now();

    while !probe() {
        assert!(
            start.elapsed() < PATIENCE,
            "the probed condition was not reached within {PATIENCE:?}"
        );

        if backoff.is_completed() {
            thread::yield_now();
        } else {
            backoff.snooze();
        }
    }
}
