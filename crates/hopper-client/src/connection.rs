// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The persistent, auto-reconnecting connection used by every runner: a
//! bounded send queue, a background worker that keeps one connection open
//! at a time, a receive callback, and an `on_connect` hook so the owner
//! can re-send its `lode_register` after a reconnect.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hopper_protocol::{framing, ClientMessage, ServerMessage};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

const EMIT_QUEUE_CAPACITY: usize = 1_000;
const RECONNECT_DELAY: Duration = Duration::from_secs(1);
const STOP_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

type OnConnect = Arc<dyn Fn() + Send + Sync>;
type OnMessage = Arc<dyn Fn(ServerMessage) + Send + Sync>;

/// Producer-side handle. Cloneable; `emit` never blocks.
#[derive(Clone)]
pub struct PersistentConnectionHandle {
    tx: mpsc::Sender<ClientMessage>,
    stop: Arc<Notify>,
    running: Arc<AtomicBool>,
}

impl PersistentConnectionHandle {
    /// Enqueue a message for delivery. Returns `false` if the queue is
    /// full or the worker has already stopped.
    pub fn emit(&self, message: ClientMessage) -> bool {
        if !self.running.load(Ordering::SeqCst) {
            return false;
        }
        self.tx.try_send(message).is_ok()
    }

    /// Ask the worker to stop: it drains its queue up to a short timeout,
    /// closes the socket, and returns.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.stop.notify_one();
    }
}

/// Owns the background worker task.
pub struct PersistentConnection {
    handle: PersistentConnectionHandle,
    join: JoinHandle<()>,
}

impl PersistentConnection {
    /// Spawn the worker. `on_connect` runs once per successful
    /// (re)connection, before any queued message is sent — this is where
    /// the runner re-sends `lode_register`. `on_message` runs for every
    /// line the daemon sends on this connection.
    pub fn spawn(
        socket_path: PathBuf,
        on_connect: impl Fn() + Send + Sync + 'static,
        on_message: impl Fn(ServerMessage) + Send + Sync + 'static,
    ) -> Self {
        let (tx, rx) = mpsc::channel(EMIT_QUEUE_CAPACITY);
        let stop = Arc::new(Notify::new());
        let running = Arc::new(AtomicBool::new(true));

        let handle = PersistentConnectionHandle {
            tx,
            stop: Arc::clone(&stop),
            running: Arc::clone(&running),
        };

        let join = tokio::spawn(run_worker(
            socket_path,
            rx,
            Arc::new(on_connect),
            Arc::new(on_message),
            stop,
            running,
        ));

        Self { handle, join }
    }

    pub fn handle(&self) -> PersistentConnectionHandle {
        self.handle.clone()
    }

    pub fn emit(&self, message: ClientMessage) -> bool {
        self.handle.emit(message)
    }

    /// Request a graceful stop and wait for the worker to finish.
    pub async fn stop(self) {
        self.handle.stop();
        let _ = self.join.await;
    }
}

async fn run_worker(
    socket_path: PathBuf,
    mut rx: mpsc::Receiver<ClientMessage>,
    on_connect: OnConnect,
    on_message: OnMessage,
    stop: Arc<Notify>,
    running: Arc<AtomicBool>,
) {
    'reconnect: loop {
        if !running.load(Ordering::SeqCst) {
            break;
        }

        let stream = tokio::select! {
            _ = stop.notified() => break 'reconnect,
            connect_result = UnixStream::connect(&socket_path) => connect_result,
        };

        let stream = match stream {
            Ok(stream) => stream,
            Err(err) => {
                tracing::debug!(%err, "persistent connection: connect failed, retrying");
                drain_queue_while_disconnected(&mut rx);
                tokio::select! {
                    _ = stop.notified() => break 'reconnect,
                    _ = tokio::time::sleep(RECONNECT_DELAY) => continue 'reconnect,
                }
            }
        };

        on_connect();
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        loop {
            tokio::select! {
                _ = stop.notified() => {
                    drain_with_timeout(&mut rx, &mut write_half).await;
                    let _ = write_half.shutdown().await;
                    break 'reconnect;
                }
                queued = rx.recv() => {
                    match queued {
                        Some(message) => {
                            if send_one(&mut write_half, &message).await.is_err() {
                                tracing::debug!("persistent connection: write failed, reconnecting");
                                continue 'reconnect;
                            }
                        }
                        None => break 'reconnect,
                    }
                }
                read_result = framing::read_message(&mut reader) => {
                    match read_result {
                        Ok(Some(message)) => on_message(message),
                        Ok(None) => {}
                        Err(framing::FramingError::ConnectionClosed) => {
                            tracing::debug!("persistent connection: peer closed, reconnecting");
                            continue 'reconnect;
                        }
                        Err(err) => {
                            tracing::debug!(%err, "persistent connection: read error, reconnecting");
                            continue 'reconnect;
                        }
                    }
                }
            }
        }
    }
}

async fn send_one(
    write_half: &mut tokio::net::unix::OwnedWriteHalf,
    message: &ClientMessage,
) -> std::io::Result<()> {
    let line = framing::encode_line(message)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
    write_half.write_all(&line).await?;
    write_half.flush().await
}

/// Items are dequeued even while disconnected but dropped rather than
/// buffered across reconnects: stale snapshots add no value once a live
/// emit is available.
fn drain_queue_while_disconnected(rx: &mut mpsc::Receiver<ClientMessage>) {
    let mut dropped = 0;
    while rx.try_recv().is_ok() {
        dropped += 1;
    }
    if dropped > 0 {
        tracing::debug!(dropped, "persistent connection: dropped queued messages while disconnected");
    }
}

/// Graceful-stop drain: best-effort flush of whatever is still queued,
/// bounded so shutdown can't hang on a stalled peer.
async fn drain_with_timeout(
    rx: &mut mpsc::Receiver<ClientMessage>,
    write_half: &mut tokio::net::unix::OwnedWriteHalf,
) {
    let _ = tokio::time::timeout(STOP_DRAIN_TIMEOUT, async {
        while let Ok(message) = rx.try_recv() {
            let _ = send_one(write_half, &message).await;
        }
    })
    .await;
}
