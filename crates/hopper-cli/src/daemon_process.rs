// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Starting and probing the `hopperd` background process, matching the
//! teacher's `daemon_process.rs` shape (background spawn, socket probe,
//! poll-until-accepting) generalized down to hopper's single-instance,
//! `fs2`-locked daemon (no version-mismatch restart dance: the daemon
//! lock already prevents two instances from racing to bind one socket).

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;

/// Start `hopperd` detached, inheriting the current environment
/// (`HOPPER_HOME` in particular) so it opens the same data directory.
pub fn start_daemon_background() -> anyhow::Result<()> {
    Command::new(crate::env::daemon_binary())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| anyhow::anyhow!("failed to start hopperd: {e}"))?;
    Ok(())
}

/// Probe whether a Unix socket is accepting connections.
pub fn probe_socket(socket_path: &Path) -> bool {
    std::os::unix::net::UnixStream::connect(socket_path).is_ok()
}

/// Block (via short sleeps) until the socket accepts connections or
/// `HOPPER_START_TIMEOUT_MS` elapses.
pub async fn wait_until_accepting(socket_path: &Path) -> bool {
    let start = Instant::now();
    let timeout = crate::env::start_timeout();
    while start.elapsed() < timeout {
        if probe_socket(socket_path) {
            return true;
        }
        tokio::time::sleep(crate::env::start_poll_interval()).await;
    }
    probe_socket(socket_path)
}
