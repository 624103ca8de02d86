// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::time::Duration;

/// Socket/queue I/O timeout: spec.md §5 "All socket operations carry a
/// 0.1-2.0s timeout so stop signals propagate." Overridable for tests.
pub fn io_timeout() -> Duration {
    std::env::var("HOPPER_IO_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(500))
}

/// Accept-loop poll timeout, so the run loop can observe a stop signal
/// even with no incoming connections (spec.md §4.2).
pub fn accept_timeout() -> Duration {
    std::env::var("HOPPER_ACCEPT_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(500))
}

/// Broadcast queue capacity (spec.md §4.2/§5: 10,000).
pub fn broadcast_queue_capacity() -> usize {
    std::env::var("HOPPER_BROADCAST_QUEUE_CAPACITY")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10_000)
}
