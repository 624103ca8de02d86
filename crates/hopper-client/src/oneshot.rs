// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A single request/response round trip over the daemon socket, used by
//! CLI commands that don't need a standing connection (`ping`, `lode
//! list`, `backlog add`, ...).

use std::path::Path;
use std::time::Duration;

use hopper_protocol::{framing, ClientMessage, ServerMessage};
use thiserror::Error;
use tokio::io::BufReader;
use tokio::net::UnixStream;

#[derive(Debug, Error)]
pub enum OneshotError {
    #[error("daemon not reachable at {0}: {1}")]
    Connect(std::path::PathBuf, std::io::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("request timed out")]
    Timeout,
    #[error("daemon closed the connection without replying")]
    NoReply,
    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Send one [`ClientMessage`] and wait for the daemon's first reply line.
/// Appropriate for request/response message types; one-way mutations
/// should use [`send_fire_and_forget`] instead since the daemon never
/// replies to those.
pub async fn connect_oneshot(
    socket_path: &Path,
    message: ClientMessage,
    timeout: Duration,
) -> Result<ServerMessage, OneshotError> {
    let stream = tokio::time::timeout(timeout, UnixStream::connect(socket_path))
        .await
        .map_err(|_| OneshotError::Timeout)?
        .map_err(|e| OneshotError::Connect(socket_path.to_path_buf(), e))?;

    let (read_half, mut write_half) = stream.into_split();
    let line = framing::encode_line(&message)?;

    tokio::time::timeout(timeout, async {
        use tokio::io::AsyncWriteExt;
        write_half.write_all(&line).await?;
        write_half.flush().await
    })
    .await
    .map_err(|_| OneshotError::Timeout)??;

    let mut reader = BufReader::new(read_half);
    loop {
        let read = tokio::time::timeout(timeout, framing::read_message(&mut reader))
            .await
            .map_err(|_| OneshotError::Timeout)?;
        match read {
            Ok(Some(reply)) => return Ok(reply),
            // Blank/unparsable lines are skipped by `read_message`; keep
            // reading for the real reply within the same timeout budget.
            Ok(None) => continue,
            Err(framing::FramingError::ConnectionClosed) => return Err(OneshotError::NoReply),
            Err(err) => return Err(OneshotError::Io(std::io::Error::other(err.to_string()))),
        }
    }
}

/// Send a one-way mutation (`lode_set_*`, `backlog_add`, ...) and return
/// as soon as the write completes — the daemon never replies directly to
/// these; observers learn of the change from its broadcast instead.
pub async fn send_fire_and_forget(
    socket_path: &Path,
    message: ClientMessage,
    timeout: Duration,
) -> Result<(), OneshotError> {
    let stream = tokio::time::timeout(timeout, UnixStream::connect(socket_path))
        .await
        .map_err(|_| OneshotError::Timeout)?
        .map_err(|e| OneshotError::Connect(socket_path.to_path_buf(), e))?;

    let mut write_half = stream;
    let line = framing::encode_line(&message)?;
    tokio::time::timeout(timeout, async {
        use tokio::io::AsyncWriteExt;
        write_half.write_all(&line).await?;
        write_half.flush().await
    })
    .await
    .map_err(|_| OneshotError::Timeout)??;
    Ok(())
}
