#![allow(dead_code)]
//! Shared helpers for paper-link integration tests.

use std::time::Duration;

/// Poll a condition until it holds or the timeout elapses.
///
/// Used to observe state driven by background tasks (upload driver,
/// connection task) without racing them.
pub async fn wait_for<F: Fn() -> bool>(cond: F, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

/// Default window for waiting on background state transitions.
pub const WAIT: Duration = Duration::from_secs(5);
