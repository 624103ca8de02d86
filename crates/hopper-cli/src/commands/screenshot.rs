// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hopper screenshot`: captures the invoking TUI's own tmux pane (spec.md
//! §6). The TUI itself sits outside the core's interface (spec.md §1); this
//! command only needs tmux's `$TMUX_PANE`, the same `capture-pane -p`
//! primitive `hopper-runner::tmux::RealTmuxAdapter` uses for the activity
//! monitor, run against whichever pane invoked it rather than a lode's.

use anyhow::{bail, Result};
use tokio::process::Command;

pub async fn handle() -> Result<()> {
    let Ok(pane) = std::env::var("TMUX_PANE") else {
        bail!("not running inside tmux (TMUX_PANE is unset)");
    };

    let output = Command::new("tmux")
        .args(["capture-pane", "-t", &pane, "-p", "-S", "-2000"])
        .output()
        .await
        .map_err(|e| anyhow::anyhow!("failed to run tmux: {e}"))?;

    if !output.status.success() {
        bail!(
            "tmux capture-pane failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }

    print!("{}", String::from_utf8_lossy(&output.stdout));
    Ok(())
}
