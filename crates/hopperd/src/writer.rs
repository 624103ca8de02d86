// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single writer task (spec.md §4.2 "Why a single writer"):
//! centralizes every outbound write so concurrent reader tasks never
//! interleave partial writes on the same client socket.

use std::collections::HashMap;
use std::sync::Arc;

use hopper_protocol::ServerMessage;
use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::net::unix::OwnedWriteHalf;
use tokio::sync::mpsc;

use crate::registry::ConnId;

/// Either a direct reply to one connection, or a fan-out to every live client.
#[derive(Debug, Clone)]
pub enum WriteTarget {
    One(ConnId),
    All,
}

#[derive(Debug, Clone)]
pub struct WriteJob {
    pub target: WriteTarget,
    pub message: ServerMessage,
}

/// Shared table of live client write-halves. The writer task is the only
/// reader of this map's *contents* for writing, but readers insert/remove
/// entries as connections come and go.
pub type Clients = Arc<Mutex<HashMap<ConnId, OwnedWriteHalf>>>;

/// Handle producers use to enqueue writes. Cloned freely; `send` never blocks.
#[derive(Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<WriteJob>,
}

impl WriterHandle {
    /// spec.md §4.2/§7: "On full queue, drop newest and log." Never blocks.
    pub fn send(&self, job: WriteJob) -> bool {
        match self.tx.try_send(job) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("broadcast queue full, dropping message");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    pub fn broadcast(&self, message: ServerMessage) -> bool {
        self.send(WriteJob {
            target: WriteTarget::All,
            message,
        })
    }

    pub fn reply(&self, conn: ConnId, message: ServerMessage) -> bool {
        self.send(WriteJob {
            target: WriteTarget::One(conn),
            message,
        })
    }
}

/// Spawn the dedicated writer task. Returns a cloneable handle for
/// producers and the shared client table the listener populates.
pub fn spawn(capacity: usize, io_timeout: std::time::Duration) -> (WriterHandle, Clients, tokio::task::JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<WriteJob>(capacity);
    let clients: Clients = Arc::new(Mutex::new(HashMap::new()));
    let clients_for_task = Arc::clone(&clients);

    let handle = tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            let line = match hopper_protocol::framing::encode_line(&job.message) {
                Ok(line) => line,
                Err(err) => {
                    tracing::warn!(%err, "failed to encode outbound message, dropping");
                    continue;
                }
            };

            // Snapshot the target connection ids under the lock, then
            // write outside it so a slow client can't stall the registry.
            let targets: Vec<ConnId> = {
                let guard = clients_for_task.lock();
                match &job.target {
                    WriteTarget::All => guard.keys().copied().collect(),
                    WriteTarget::One(id) => {
                        if guard.contains_key(id) {
                            vec![*id]
                        } else {
                            Vec::new()
                        }
                    }
                }
            };

            let mut dead = Vec::new();
            for conn_id in targets {
                let write_result = {
                    // Take the write half out for the duration of the
                    // write so the lock isn't held across an .await.
                    let half = clients_for_task.lock().remove(&conn_id);
                    let Some(mut half) = half else { continue };
                    let result = tokio::time::timeout(io_timeout, async {
                        half.write_all(&line).await?;
                        half.flush().await
                    })
                    .await;
                    clients_for_task.lock().insert(conn_id, half);
                    result
                };

                match write_result {
                    Ok(Ok(())) => {}
                    Ok(Err(_)) | Err(_) => dead.push(conn_id),
                }
            }

            if !dead.is_empty() {
                let mut guard = clients_for_task.lock();
                for conn_id in dead {
                    guard.remove(&conn_id);
                }
            }
        }
    });

    (WriterHandle { tx }, clients, handle)
}
