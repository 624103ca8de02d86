// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin tmux adapter for the runner: pane capture, window rename, key
//! injection, spawn, exit status. Generalizes the teacher's
//! `oj-adapters::session::TmuxAdapter` down to the narrow slice the
//! runner actually drives, rather than a general session abstraction.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum TmuxError {
    #[error("tmux command failed: {0}")]
    CommandFailed(String),
    #[error("pane not found: {0}")]
    NotFound(String),
}

/// The runner's view of a terminal multiplexer. Narrower than the
/// teacher's `SessionAdapter` trait — only what the stage runner needs
/// to drive an interactive agent session.
#[async_trait]
pub trait TmuxAdapter: Send + Sync {
    /// Spawn `cmd` in a new detached pane at `cwd` with `env`, returning
    /// the pane id.
    async fn spawn(
        &self,
        name: &str,
        cwd: &Path,
        cmd: &str,
        env: &[(String, String)],
    ) -> Result<String, TmuxError>;

    /// Snapshot of the pane's visible contents plus scrollback.
    async fn capture(&self, pane: &str) -> Result<String, TmuxError>;

    /// Rename the pane's window so `tmux list-windows` reflects the lode's
    /// current title.
    async fn rename_window(&self, pane: &str, title: &str) -> Result<(), TmuxError>;

    /// Send a named key (e.g. `"C-d"`) to the pane.
    async fn send_key(&self, pane: &str, key: &str) -> Result<(), TmuxError>;

    /// `Some(code)` once the pane's process has exited, `None` while
    /// still running.
    async fn exit_code(&self, pane: &str) -> Result<Option<i32>, TmuxError>;

    async fn is_alive(&self, pane: &str) -> Result<bool, TmuxError>;
}

#[derive(Clone, Default)]
pub struct RealTmuxAdapter;

#[async_trait]
impl TmuxAdapter for RealTmuxAdapter {
    async fn spawn(
        &self,
        name: &str,
        cwd: &Path,
        cmd: &str,
        env: &[(String, String)],
    ) -> Result<String, TmuxError> {
        let session_id = format!("hopper-{name}");

        let existing = Command::new("tmux")
            .args(["has-session", "-t", &session_id])
            .output()
            .await;
        if existing.map(|o| o.status.success()).unwrap_or(false) {
            let _ = Command::new("tmux")
                .args(["kill-session", "-t", &session_id])
                .output()
                .await;
        }

        let mut tmux_cmd = Command::new("tmux");
        tmux_cmd
            .arg("new-session")
            .arg("-d")
            .arg("-s")
            .arg(&session_id)
            .arg("-c")
            .arg(cwd);
        for (key, value) in env {
            tmux_cmd.arg("-e").arg(format!("{key}={value}"));
        }
        tmux_cmd.arg(cmd);

        let output = tmux_cmd
            .output()
            .await
            .map_err(|e| TmuxError::CommandFailed(e.to_string()))?;
        if !output.status.success() {
            return Err(TmuxError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }
        Ok(session_id)
    }

    async fn capture(&self, pane: &str) -> Result<String, TmuxError> {
        let output = Command::new("tmux")
            .args(["capture-pane", "-t", pane, "-p", "-S", "-2000"])
            .output()
            .await
            .map_err(|e| TmuxError::CommandFailed(e.to_string()))?;
        if !output.status.success() {
            return Err(TmuxError::NotFound(pane.to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn rename_window(&self, pane: &str, title: &str) -> Result<(), TmuxError> {
        let output = Command::new("tmux")
            .args(["rename-window", "-t", pane, title])
            .output()
            .await
            .map_err(|e| TmuxError::CommandFailed(e.to_string()))?;
        if !output.status.success() {
            // Non-fatal: a rename failure doesn't affect monitoring.
            tracing::debug!(pane, title, "tmux rename-window failed, continuing");
        }
        Ok(())
    }

    async fn send_key(&self, pane: &str, key: &str) -> Result<(), TmuxError> {
        let output = Command::new("tmux")
            .args(["send-keys", "-t", pane, key])
            .output()
            .await
            .map_err(|e| TmuxError::CommandFailed(e.to_string()))?;
        if !output.status.success() {
            return Err(TmuxError::NotFound(pane.to_string()));
        }
        Ok(())
    }

    async fn exit_code(&self, pane: &str) -> Result<Option<i32>, TmuxError> {
        let output = Command::new("tmux")
            .args(["display-message", "-t", pane, "-p", "#{pane_dead_status}"])
            .output()
            .await
            .map_err(|e| TmuxError::CommandFailed(e.to_string()))?;
        if !output.status.success() {
            return Err(TmuxError::NotFound(pane.to_string()));
        }
        let raw = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if raw.is_empty() {
            return Ok(None);
        }
        Ok(raw.parse::<i32>().ok())
    }

    async fn is_alive(&self, pane: &str) -> Result<bool, TmuxError> {
        let output = Command::new("tmux")
            .args(["has-session", "-t", pane])
            .output()
            .await
            .map_err(|e| TmuxError::CommandFailed(e.to_string()))?;
        Ok(output.status.success())
    }
}

/// Fake adapter for unit tests: scripted capture sequence and a canned
/// exit code, no real tmux process.
#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    #[derive(Default)]
    pub struct FakeTmuxAdapter {
        pub captures: Mutex<VecDeque<String>>,
        pub exit_code: Mutex<Option<i32>>,
        pub sent_keys: Mutex<Vec<(String, String)>>,
        pub renamed: Mutex<Vec<(String, String)>>,
        pub spawned: Mutex<Vec<(String, std::path::PathBuf, String)>>,
    }

    impl FakeTmuxAdapter {
        pub fn with_captures(captures: Vec<&str>) -> Self {
            Self {
                captures: Mutex::new(captures.into_iter().map(String::from).collect()),
                ..Default::default()
            }
        }

        pub fn set_exit_code(&self, code: i32) {
            *self.exit_code.lock() = Some(code);
        }
    }

    #[async_trait]
    impl TmuxAdapter for FakeTmuxAdapter {
        async fn spawn(
            &self,
            name: &str,
            cwd: &Path,
            cmd: &str,
            _env: &[(String, String)],
        ) -> Result<String, TmuxError> {
            self.spawned
                .lock()
                .push((name.to_string(), cwd.to_path_buf(), cmd.to_string()));
            Ok(format!("hopper-{name}"))
        }

        async fn capture(&self, _pane: &str) -> Result<String, TmuxError> {
            let mut captures = self.captures.lock();
            if captures.len() > 1 {
                Ok(captures.pop_front().unwrap_or_default())
            } else {
                Ok(captures.front().cloned().unwrap_or_default())
            }
        }

        async fn rename_window(&self, pane: &str, title: &str) -> Result<(), TmuxError> {
            self.renamed.lock().push((pane.to_string(), title.to_string()));
            Ok(())
        }

        async fn send_key(&self, pane: &str, key: &str) -> Result<(), TmuxError> {
            self.sent_keys.lock().push((pane.to_string(), key.to_string()));
            Ok(())
        }

        async fn exit_code(&self, _pane: &str) -> Result<Option<i32>, TmuxError> {
            Ok(*self.exit_code.lock())
        }

        async fn is_alive(&self, _pane: &str) -> Result<bool, TmuxError> {
            Ok(self.exit_code.lock().is_none())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeTmuxAdapter;
    use super::*;

    #[tokio::test]
    async fn fake_capture_cycles_through_scripted_snapshots() {
        let adapter = FakeTmuxAdapter::with_captures(vec!["one", "two"]);
        assert_eq!(adapter.capture("p").await.unwrap(), "one");
        assert_eq!(adapter.capture("p").await.unwrap(), "two");
        assert_eq!(adapter.capture("p").await.unwrap(), "two");
    }

    #[tokio::test]
    async fn fake_exit_code_starts_running() {
        let adapter = FakeTmuxAdapter::default();
        assert_eq!(adapter.exit_code("p").await.unwrap(), None);
        adapter.set_exit_code(0);
        assert_eq!(adapter.exit_code("p").await.unwrap(), Some(0));
    }
}
