// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hopper lode` — list, create, restart, and watch lodes (spec.md §6).

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use hopper_protocol::{ClientMessage, ServerMessage};

#[derive(Args)]
pub struct LodeArgs {
    #[command(subcommand)]
    pub command: LodeCommand,
}

#[derive(Subcommand)]
pub enum LodeCommand {
    /// List active lodes
    List {},
    /// Create a new lode and spawn its first runner
    Create {
        /// Registered project name
        project: String,
        /// Mill scope text
        scope: String,
        /// Don't spawn the mill runner immediately
        #[arg(long)]
        no_spawn: bool,
    },
    /// Spawn a runner for a lode that has no owner
    Restart {
        /// Lode id
        lode_id: String,
    },
    /// Stream state changes for one lode until it errors or is archived
    Watch {
        /// Lode id
        lode_id: String,
    },
}

pub async fn handle(args: LodeArgs) -> Result<()> {
    match args.command {
        LodeCommand::List {} => list().await,
        LodeCommand::Create { project, scope, no_spawn } => create(project, scope, !no_spawn).await,
        LodeCommand::Restart { lode_id } => restart(lode_id).await,
        LodeCommand::Watch { lode_id } => watch(lode_id).await,
    }
}

async fn list() -> Result<()> {
    let reply = hopper_client::connect_oneshot(
        &crate::env::socket_path(),
        ClientMessage::LodeList { ts: None },
        crate::env::request_timeout(),
    )
    .await?;

    let lodes = match reply {
        ServerMessage::LodeList { lodes, .. } => lodes,
        other => bail!("unexpected reply to lode_list: {}", other.type_name()),
    };

    if lodes.is_empty() {
        println!("no active lodes");
        return Ok(());
    }

    for lode in &lodes {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            lode.id.as_str(),
            lode.stage,
            lode.state,
            lode.project,
            lode.title
        );
    }
    Ok(())
}

async fn create(project: String, scope: String, spawn: bool) -> Result<()> {
    let reply = hopper_client::connect_oneshot(
        &crate::env::socket_path(),
        ClientMessage::LodeCreate { project, scope, spawn, ts: None },
        crate::env::request_timeout(),
    )
    .await?;

    match reply {
        ServerMessage::LodeCreated { lode, .. } => {
            println!("{}", lode.id.as_str());
            Ok(())
        }
        other => bail!("unexpected reply to lode_create: {}", other.type_name()),
    }
}

/// `hopper lode restart`: shell out to `hopper process <lode_id>` detached,
/// the same way `hopperd`'s `RunnerSpawner` does on auto-advance. Refuses
/// when the lode already has a live owner (spec.md invariant 1).
async fn restart(lode_id: String) -> Result<()> {
    let reply = hopper_client::connect_oneshot(
        &crate::env::socket_path(),
        ClientMessage::Connect { lode_id: Some(lode_id.clone().into()), ts: None },
        crate::env::request_timeout(),
    )
    .await?;

    match reply {
        ServerMessage::Connected { lode: Some(lode), lode_found: Some(true), .. } => {
            if lode.active {
                bail!("lode {lode_id} already has an active runner");
            }
            if lode.is_terminal() {
                bail!("lode {lode_id} is shipped; nothing left to run");
            }
        }
        ServerMessage::Connected { .. } => bail!("unknown lode: {lode_id}"),
        other => bail!("unexpected reply to connect: {}", other.type_name()),
    }

    std::process::Command::new(std::env::current_exe()?)
        .arg("process")
        .arg(&lode_id)
        .spawn()
        .map_err(|e| anyhow::anyhow!("failed to spawn runner: {e}"))?;
    println!("restarted {lode_id}");
    Ok(())
}

/// `hopper lode watch`: a read-only observer. Prints every `lode_updated`
/// broadcast for `lode_id` until the lode reaches `error` or is archived,
/// exiting 1 on the former per spec.md §7's "user-visible failure
/// behavior".
async fn watch(lode_id: String) -> Result<()> {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    let socket_path = crate::env::socket_path();
    let target = lode_id.clone();
    let saw_error = Arc::new(AtomicBool::new(false));
    let done = Arc::new(AtomicBool::new(false));
    let saw_error_cb = Arc::clone(&saw_error);
    let done_cb = Arc::clone(&done);
    let target_cb = target.clone();

    let conn = hopper_client::PersistentConnection::spawn(
        socket_path,
        {
            let target = target.clone();
            move || {
                // Read-only: a watch client never claims ownership.
                let _ = &target;
            }
        },
        move |msg| match &msg {
            ServerMessage::LodeUpdated { lode, .. } if lode.id.as_str() == target_cb => {
                println!("{}\t{}\t{}", lode.stage, lode.state, lode.status);
                if lode.state.as_str() == "error" {
                    saw_error_cb.store(true, Ordering::SeqCst);
                    done_cb.store(true, Ordering::SeqCst);
                }
            }
            ServerMessage::LodeArchived { lode, .. } if lode.id.as_str() == target_cb => {
                done_cb.store(true, Ordering::SeqCst);
            }
            ServerMessage::Shutdown { .. } => {
                done_cb.store(true, Ordering::SeqCst);
            }
            _ => {}
        },
    );
    conn.emit(ClientMessage::Connect { lode_id: Some(lode_id.into()), ts: None });

    while !done.load(Ordering::SeqCst) {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    conn.stop().await;

    if saw_error.load(Ordering::SeqCst) {
        std::process::exit(1);
    }
    Ok(())
}
