// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pane activity monitor: polls the agent's tmux pane, flips a lode
//! between `running` and `stuck` based on whether its content changed
//! since the previous poll.

use std::sync::Arc;
use std::time::Instant;

use hopper_core::LodeId;
use hopper_protocol::ClientMessage;
use tokio::sync::oneshot;

use crate::env::monitor_interval;
use crate::tmux::TmuxAdapter;

pub struct MonitorHandle {
    shutdown: Option<oneshot::Sender<()>>,
    join: tokio::task::JoinHandle<()>,
}

impl MonitorHandle {
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = self.join.await;
    }
}

/// Start the background poll loop for `pane`. Renames the pane's window
/// to `lode_id` before the first poll.
pub fn spawn(
    tmux: Arc<dyn TmuxAdapter>,
    pane: String,
    lode_id: String,
    emit: impl Fn(ClientMessage) -> bool + Send + Sync + 'static,
) -> MonitorHandle {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let join = tokio::spawn(monitor_loop(tmux, pane, lode_id, emit, shutdown_rx));
    MonitorHandle {
        shutdown: Some(shutdown_tx),
        join,
    }
}

async fn monitor_loop(
    tmux: Arc<dyn TmuxAdapter>,
    pane: String,
    lode_id: String,
    emit: impl Fn(ClientMessage) -> bool + Send + Sync,
    mut shutdown: oneshot::Receiver<()>,
) {
    let _ = tmux.rename_window(&pane, &lode_id).await;

    let mut previous: Option<String> = None;
    let mut stuck_since: Option<Instant> = None;

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(monitor_interval()) => {}
        }

        let current = match tmux.capture(&pane).await {
            Ok(content) => content,
            Err(err) => {
                tracing::debug!(%err, pane, "monitor: pane capture failed, stopping");
                break;
            }
        };

        match &previous {
            Some(prev) if prev == &current => {
                let since = stuck_since.get_or_insert_with(Instant::now);
                let elapsed = since.elapsed().as_secs();
                emit(ClientMessage::LodeSetState {
                    lode_id: LodeId::from(lode_id.as_str()),
                    state: "stuck".to_string(),
                    status: format!("No output for {elapsed}s"),
                    ts: None,
                });
            }
            _ => {
                if stuck_since.take().is_some() {
                    emit(ClientMessage::LodeSetState {
                        lode_id: LodeId::from(lode_id.as_str()),
                        state: "running".to_string(),
                        status: "Claude running".to_string(),
                        ts: None,
                    });
                }
            }
        }
        previous = Some(current);
    }
}
