// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI crate, mirroring
//! `hopperd::env`/`hopper-runner::env`'s overridable-but-sane-default pattern.

use std::path::PathBuf;
use std::time::Duration;

/// `HOPPER_HOME` if set, else the platform data directory's `hopper`
/// subdirectory. Thin re-export so command modules don't need to depend
/// on `hopper-store` just for this.
pub fn home() -> PathBuf {
    hopper_store::paths::home_dir()
}

pub fn socket_path() -> PathBuf {
    hopper_store::paths::socket_path(&home())
}

/// Timeout for one-shot request/response round trips to the daemon.
pub fn request_timeout() -> Duration {
    millis_env("HOPPER_REQUEST_TIMEOUT_MS", 5_000)
}

/// How long `up` waits for a freshly spawned daemon to start accepting
/// connections before giving up.
pub fn start_timeout() -> Duration {
    millis_env("HOPPER_START_TIMEOUT_MS", 5_000)
}

pub fn start_poll_interval() -> Duration {
    millis_env("HOPPER_START_POLL_MS", 50)
}

fn millis_env(var: &str, default_ms: u64) -> Duration {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(default_ms))
}

/// Override for the `hopperd` binary path, for dev builds/tests where it
/// doesn't sit on `PATH`.
pub fn daemon_binary() -> String {
    std::env::var("HOPPER_DAEMON_BINARY").unwrap_or_else(|_| "hopperd".to_string())
}

/// The lode a `processed`/`status`/`code` invocation acts on, set by the
/// runner on the agent subprocess's environment (spec.md §6).
pub fn current_lode_id() -> Option<String> {
    std::env::var("HOPPER_LID").ok().filter(|s| !s.is_empty())
}
