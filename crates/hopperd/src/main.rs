// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hopperd`: start the coordinator, bind the socket, and run until a
//! signal asks it to stop (spec.md §4.2, §5).

use std::sync::Arc;

use hopper_core::{RandomIdGen, Stage, SystemClock};
use hopper_store::Store;
use hopperd::coordinator::{Coordinator, RunnerSpawner};
use hopperd::{activity_log, env, lock, server, writer};

/// Spawns `hopper process <lode_id>` detached, inheriting the daemon's
/// environment. Best-effort: a spawn failure is logged, not propagated,
/// since the coordinator has no reply channel for this path.
struct ProcessSpawner;

impl RunnerSpawner for ProcessSpawner {
    fn spawn(&self, lode_id: &str, stage: Stage) {
        let lode_id = lode_id.to_string();
        let binary = std::env::var("HOPPER_CLI_BINARY").unwrap_or_else(|_| "hopper".to_string());
        tracing::info!(lode_id = %lode_id, %stage, "spawning runner");
        match std::process::Command::new(&binary)
            .arg("process")
            .arg(&lode_id)
            .spawn()
        {
            Ok(_child) => {}
            Err(err) => {
                tracing::warn!(%err, lode_id = %lode_id, binary = %binary, "failed to spawn runner");
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let home = hopper_store::paths::home_dir();
    std::fs::create_dir_all(&home)?;

    let _lock = lock::DaemonLock::acquire(&hopper_store::paths::daemon_lock(&home))?;
    let _activity_guard = activity_log::install(&home)?;

    let mut store = Store::load(&home)?;
    store.reconcile_startup()?;

    let (writer_handle, clients, writer_join) =
        writer::spawn(env::broadcast_queue_capacity(), env::io_timeout());

    let coordinator = Arc::new(Coordinator::new(
        store,
        Arc::new(SystemClock),
        Arc::new(RandomIdGen),
        writer_handle,
        Arc::new(ProcessSpawner),
        None,
    ));

    let socket_path = server::default_socket_path(&home);
    let handle = server::run(socket_path, coordinator, clients, env::accept_timeout()).await?;

    wait_for_shutdown_signal().await;
    tracing::info!("shutdown signal received");
    handle.shutdown();
    handle.join().await;
    writer_join.abort();

    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(_) => {
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = sigterm.recv() => {}
        _ = tokio::signal::ctrl_c() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
