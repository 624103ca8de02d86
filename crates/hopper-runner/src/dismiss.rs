// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Auto-dismiss watcher: after the stage's done signal arrives, waits
//! for the pane to stop changing, then sends two Ctrl-D key events so
//! the agent exits cleanly and the runner's subprocess wait returns.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

use crate::env::dismiss_poll_interval;
use crate::tmux::TmuxAdapter;

pub struct DismissHandle {
    done: Arc<Notify>,
    stop: Arc<AtomicBool>,
    join: tokio::task::JoinHandle<()>,
}

impl DismissHandle {
    /// Called once the done signal (a `lode_updated` with `state ==
    /// completed`) has been observed for this lode.
    pub fn signal_done(&self) {
        self.done.notify_one();
    }

    pub async fn stop(self) {
        self.stop.store(true, Ordering::SeqCst);
        self.done.notify_one();
        let _ = self.join.await;
    }
}

pub fn spawn(tmux: Arc<dyn TmuxAdapter>, pane: String) -> DismissHandle {
    let done = Arc::new(Notify::new());
    let stop = Arc::new(AtomicBool::new(false));
    let join = tokio::spawn(dismiss_loop(
        tmux,
        pane,
        Arc::clone(&done),
        Arc::clone(&stop),
    ));
    DismissHandle { done, stop, join }
}

async fn dismiss_loop(
    tmux: Arc<dyn TmuxAdapter>,
    pane: String,
    done: Arc<Notify>,
    stop: Arc<AtomicBool>,
) {
    done.notified().await;
    if stop.load(Ordering::SeqCst) {
        return;
    }

    let mut previous: Option<String> = None;
    loop {
        if stop.load(Ordering::SeqCst) {
            return;
        }
        tokio::time::sleep(dismiss_poll_interval()).await;
        if stop.load(Ordering::SeqCst) {
            return;
        }

        let current = match tmux.capture(&pane).await {
            Ok(content) => content,
            Err(_) => return,
        };

        if previous.as_deref() == Some(current.as_str()) {
            let _ = tmux.send_key(&pane, "C-d").await;
            let _ = tmux.send_key(&pane, "C-d").await;
            return;
        }
        previous = Some(current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tmux::fake::FakeTmuxAdapter;

    #[tokio::test]
    #[serial_test::serial]
    async fn sends_two_ctrl_d_once_pane_stabilizes() {
        std::env::set_var("HOPPER_DISMISS_POLL_MS", "10");
        let adapter = Arc::new(FakeTmuxAdapter::with_captures(vec!["done", "done", "done"]));
        let handle = spawn(adapter.clone(), "pane".to_string());
        handle.signal_done();

        tokio::time::sleep(std::time::Duration::from_millis(60)).await;
        let sent = adapter.sent_keys.lock().clone();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|(_, key)| key == "C-d"));
        std::env::remove_var("HOPPER_DISMISS_POLL_MS");
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn stop_before_done_signal_exits_cleanly() {
        std::env::set_var("HOPPER_DISMISS_POLL_MS", "10");
        let adapter = Arc::new(FakeTmuxAdapter::with_captures(vec!["x"]));
        let handle = spawn(adapter.clone(), "pane".to_string());
        handle.stop().await;
        assert!(adapter.sent_keys.lock().is_empty());
        std::env::remove_var("HOPPER_DISMISS_POLL_MS");
    }
}
