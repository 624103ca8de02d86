// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the runner crate, mirroring
//! `hopperd::env`'s pattern of overridable-but-sane-default durations.

use std::time::Duration;

/// Poll interval for the activity monitor; pane content unchanged across
/// one interval flips a lode to `stuck`.
pub fn monitor_interval() -> Duration {
    millis_env("HOPPER_MONITOR_INTERVAL_MS", 5_000)
}

/// Poll interval the auto-dismiss watcher uses once waiting for two
/// consecutive identical captures before it sends Ctrl-D.
pub fn dismiss_poll_interval() -> Duration {
    millis_env("HOPPER_DISMISS_POLL_MS", 5_000)
}

/// How often the runner polls the tmux pane for its exit status while
/// waiting for the agent process to finish.
pub fn exit_poll_interval() -> Duration {
    millis_env("HOPPER_EXIT_POLL_MS", 1_000)
}

/// IPC timeout for the one-shot handshake performed before a stage starts.
pub fn handshake_timeout() -> Duration {
    millis_env("HOPPER_HANDSHAKE_TIMEOUT_MS", 2_000)
}

fn millis_env(var: &str, default_ms: u64) -> Duration {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(default_ms))
}

/// The agent binary to spawn for the interactive coding session. Matches
/// the teacher's `oj-adapters` default of a bare `claude` looked up on
/// `PATH`, overridable for tests/CI.
pub fn agent_binary() -> String {
    std::env::var("HOPPER_AGENT_BINARY").unwrap_or_else(|_| "claude".to_string())
}

/// The non-interactive helper used for the refine-stage codex bootstrap.
pub fn codex_binary() -> String {
    std::env::var("HOPPER_CODEX_BINARY").unwrap_or_else(|_| "codex".to_string())
}
