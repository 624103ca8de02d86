// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Non-interactive bootstrap of a codex thread for the refine stage.

use std::path::Path;

use serde_json::Value;
use thiserror::Error;
use tokio::process::Command;

use crate::env::codex_binary;

const CODEX_FLAGS: &str = "--dangerously-bypass-approvals-and-sandbox";

#[derive(Debug, Error)]
pub enum CodexError {
    #[error("codex binary not found")]
    BinaryMissing,
    #[error("codex exited {0}: {1}")]
    NonZeroExit(i32, String),
    #[error("codex produced no thread_id")]
    ThreadIdMissing,
}

/// Run `codex exec <flags> --json <prompt>` in `cwd`, returning the
/// thread id parsed from the first `thread.started` JSONL event.
pub async fn bootstrap(
    prompt: &str,
    cwd: &Path,
    env: &[(String, String)],
) -> Result<String, CodexError> {
    let mut cmd = Command::new(codex_binary());
    cmd.arg("exec")
        .arg(CODEX_FLAGS)
        .arg("--json")
        .arg(prompt)
        .current_dir(cwd);
    for (key, value) in env {
        cmd.env(key, value);
    }

    let output = cmd.output().await.map_err(|_| CodexError::BinaryMissing)?;
    let thread_id = parse_thread_id(&String::from_utf8_lossy(&output.stdout));

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(CodexError::NonZeroExit(
            output.status.code().unwrap_or(1),
            stderr,
        ));
    }

    thread_id.ok_or(CodexError::ThreadIdMissing)
}

/// Resume an existing thread, writing the final agent message to
/// `output_file`. Returns the process exit code.
pub async fn run_resume(
    prompt: &str,
    cwd: &Path,
    output_file: &Path,
    thread_id: &str,
    env: &[(String, String)],
) -> Result<i32, CodexError> {
    let mut cmd = Command::new(codex_binary());
    cmd.arg("exec")
        .arg(CODEX_FLAGS)
        .arg("-o")
        .arg(output_file)
        .arg("resume")
        .arg(thread_id)
        .arg(prompt)
        .current_dir(cwd);
    for (key, value) in env {
        cmd.env(key, value);
    }

    let status = cmd.status().await.map_err(|_| CodexError::BinaryMissing)?;
    Ok(status.code().unwrap_or(1))
}

fn parse_thread_id(stdout: &str) -> Option<String> {
    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Ok(event) = serde_json::from_str::<Value>(line) else {
            continue;
        };
        if event.get("type").and_then(Value::as_str) == Some("thread.started") {
            if let Some(id) = event.get("thread_id").and_then(Value::as_str) {
                return Some(id.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_thread_id_finds_the_started_event() {
        let stdout = "{\"type\":\"other\"}\n{\"type\":\"thread.started\",\"thread_id\":\"abc-123\"}\n";
        assert_eq!(parse_thread_id(stdout), Some("abc-123".to_string()));
    }

    #[test]
    fn parse_thread_id_skips_unparsable_lines() {
        let stdout = "not json\n\n{\"type\":\"thread.started\",\"thread_id\":\"xyz\"}";
        assert_eq!(parse_thread_id(stdout), Some("xyz".to_string()));
    }

    #[test]
    fn parse_thread_id_none_when_absent() {
        assert_eq!(parse_thread_id("{\"type\":\"other\"}"), None);
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn bootstrap_reports_binary_missing() {
        std::env::set_var("HOPPER_CODEX_BINARY", "hopper-codex-definitely-not-on-path");
        let result = bootstrap("hi", Path::new("."), &[]).await;
        assert!(matches!(result, Err(CodexError::BinaryMissing)));
        std::env::remove_var("HOPPER_CODEX_BINARY");
    }
}
