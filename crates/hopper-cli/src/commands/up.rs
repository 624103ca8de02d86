// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hopper up`: start the coordinator if it isn't already running.
//!
//! The TUI half named in spec.md §6 is out of scope at the core's
//! interface; this command starts `hopperd` and confirms it is accepting
//! connections, which is as far as the core's responsibility extends.

use crate::daemon_process::{probe_socket, start_daemon_background, wait_until_accepting};

pub async fn handle() -> anyhow::Result<()> {
    let socket_path = crate::env::socket_path();

    if probe_socket(&socket_path) {
        println!("hopperd already running at {}", socket_path.display());
        return Ok(());
    }

    start_daemon_background()?;
    if wait_until_accepting(&socket_path).await {
        println!("hopperd started at {}", socket_path.display());
        Ok(())
    } else {
        anyhow::bail!(
            "hopperd did not start accepting connections at {} in time",
            socket_path.display()
        )
    }
}
