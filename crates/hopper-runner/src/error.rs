// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner error taxonomy.

use thiserror::Error;

/// An error surfaced during a stage run. Its `Display` text is what gets
/// emitted as the lode's error status and printed to stderr; `exit_code`
/// is what the process exits with.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("{0}")]
    Precondition(String),

    #[error("agent binary not found: {0}")]
    BinaryMissing(String),

    #[error("codex bootstrap failed: {0}")]
    CodexBootstrap(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("daemon handshake failed: {0}")]
    Handshake(String),

    #[error("lode is owned by another runner")]
    AlreadyOwned,

    #[error("lode not found")]
    LodeNotFound,
}

impl RunnerError {
    /// Exit code for a `process <lode_id>` invocation that failed before
    /// the agent ever ran.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunnerError::BinaryMissing(_) => 127,
            _ => 1,
        }
    }
}
