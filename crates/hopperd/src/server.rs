// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The accept loop: binds the unix socket, spawns one reader task per
//! connection, and tears everything down on a graceful shutdown signal.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hopper_protocol::framing;
use tokio::io::BufReader;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;

use crate::coordinator::Coordinator;
use crate::registry::ConnId;
use crate::writer::Clients;

/// Handle to a running daemon: signal it to stop and wait for full teardown.
pub struct ServerHandle {
    shutdown: Arc<Notify>,
    join: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Ask the accept loop to stop taking new connections, broadcast a
    /// `shutdown` message, and close every client socket.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    pub async fn join(self) {
        let _ = self.join.await;
    }
}

/// Bind `socket_path`, removing any stale socket file left by a crashed
/// prior instance, and run the accept loop until [`ServerHandle::shutdown`]
/// is called.
pub async fn run(
    socket_path: PathBuf,
    coordinator: Arc<Coordinator>,
    writer_clients: Clients,
    accept_timeout: Duration,
) -> std::io::Result<ServerHandle> {
    if socket_path.exists() {
        std::fs::remove_file(&socket_path)?;
    }
    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let listener = UnixListener::bind(&socket_path)?;
    tracing::info!(path = %socket_path.display(), "listening");

    let shutdown = Arc::new(Notify::new());
    let shutdown_for_task = Arc::clone(&shutdown);
    let next_conn = Arc::new(AtomicU64::new(1));

    let join = tokio::spawn(async move {
        accept_loop(
            listener,
            coordinator,
            writer_clients,
            next_conn,
            shutdown_for_task,
            accept_timeout,
            socket_path,
        )
        .await;
    });

    Ok(ServerHandle { shutdown, join })
}

async fn accept_loop(
    listener: UnixListener,
    coordinator: Arc<Coordinator>,
    clients: Clients,
    next_conn: Arc<AtomicU64>,
    shutdown: Arc<Notify>,
    accept_timeout: Duration,
    socket_path: PathBuf,
) {
    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                break;
            }
            accept_result = tokio::time::timeout(accept_timeout, listener.accept()) => {
                match accept_result {
                    Ok(Ok((stream, _addr))) => {
                        let conn_id = next_conn.fetch_add(1, Ordering::SeqCst);
                        spawn_connection(conn_id, stream, Arc::clone(&coordinator), Arc::clone(&clients));
                    }
                    Ok(Err(err)) => {
                        tracing::warn!(%err, "accept failed");
                    }
                    Err(_elapsed) => {
                        // Plain poll tick; lets the shutdown branch above
                        // get a fair chance even under a steady stream of
                        // incoming connections.
                    }
                }
            }
        }
    }

    tracing::info!("shutting down");
    // Active ownership (`active`/`tmux_pane`/`pid`) is left as-is on disk;
    // the next daemon startup's `reconcile_startup` clears it (spec.md
    // §4.1) rather than this path racing per-connection auto-advance
    // logic during teardown.
    let broadcast = hopper_protocol::ServerMessage::Shutdown { ts: None };
    let conn_ids: Vec<ConnId> = clients.lock().keys().copied().collect();
    for conn_id in conn_ids {
        if let Some(mut half) = clients.lock().remove(&conn_id) {
            if let Ok(line) = framing::encode_line(&broadcast) {
                use tokio::io::AsyncWriteExt;
                let _ = tokio::time::timeout(Duration::from_millis(200), async {
                    half.write_all(&line).await?;
                    half.flush().await
                })
                .await;
            }
            let _ = half.shutdown().await;
        }
    }
    let _ = coordinator;

    let _ = std::fs::remove_file(&socket_path);
}

fn spawn_connection(conn_id: ConnId, stream: UnixStream, coordinator: Arc<Coordinator>, clients: Clients) {
    let (read_half, write_half) = stream.into_split();
    clients.lock().insert(conn_id, write_half);

    tokio::spawn(async move {
        let mut reader = BufReader::new(read_half);
        loop {
            match framing::read_message(&mut reader).await {
                Ok(Some(msg)) => {
                    tracing::debug!(conn = conn_id, kind = msg.type_name(), "received");
                    let outcome = coordinator.handle(conn_id, msg);
                    coordinator.dispatch_outcome(conn_id, outcome, &clients);
                }
                Ok(None) => {
                    // Blank line or unparsable JSON: keep reading.
                }
                Err(framing::FramingError::ConnectionClosed) => break,
                Err(err) => {
                    tracing::debug!(conn = conn_id, %err, "read error, closing connection");
                    break;
                }
            }
        }
        clients.lock().remove(&conn_id);
        let outcome = coordinator.handle_disconnect(conn_id);
        coordinator.dispatch_outcome(conn_id, outcome, &clients);
    });
}

pub fn default_socket_path(home: &Path) -> PathBuf {
    hopper_store::paths::socket_path(home)
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
