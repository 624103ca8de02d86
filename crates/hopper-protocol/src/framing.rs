// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Newline-delimited JSON framing.
//!
//! One message per UTF-8 line. Readers silently drop empty lines, lines
//! that fail to parse as JSON, and lines longer than [`MAX_LINE_BYTES`] —
//! spec.md §4.2/§7: "Parse errors and one-line-too-long conditions are
//! silently dropped (the sender will retry or move on)."

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// A line longer than this is dropped rather than buffered forever.
pub const MAX_LINE_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum FramingError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed")]
    ConnectionClosed,
}

/// Encode one message as a single newline-terminated JSON line.
pub fn encode_line<T: Serialize>(msg: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut bytes = serde_json::to_vec(msg)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Write one message, flushing immediately (the source calls `sendall`
/// per message; there's no batching to preserve).
pub async fn write_line<W, T>(writer: &mut W, msg: &T) -> Result<(), FramingError>
where
    W: AsyncWriteExt + Unpin,
    T: Serialize,
{
    let line = encode_line(msg).map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
    })?;
    writer.write_all(&line).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one line from a buffered reader and parse it as `T`, skipping
/// blank lines and swallowing parse errors by returning `Ok(None)` so the
/// caller's read loop continues rather than tearing down the connection.
///
/// Returns `Err(ConnectionClosed)` on EOF.
pub async fn read_message<R, T>(reader: &mut BufReader<R>) -> Result<Option<T>, FramingError>
where
    R: tokio::io::AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut line = String::new();
    let n = reader.read_line(&mut line).await?;
    if n == 0 {
        return Err(FramingError::ConnectionClosed);
    }

    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.len() > MAX_LINE_BYTES {
        tracing::debug!(len = trimmed.len(), "dropping oversized line");
        return Ok(None);
    }

    match serde_json::from_str(trimmed) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            tracing::debug!(%err, "dropping unparsable line");
            Ok(None)
        }
    }
}
