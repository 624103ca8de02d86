// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hopper backlog` — deferred lode ideas (spec.md §3, §6).

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use hopper_protocol::{ClientMessage, ServerMessage};
use hopper_store::backlog::{find_by_prefix, PrefixMatch};

#[derive(Args)]
pub struct BacklogArgs {
    #[command(subcommand)]
    pub command: BacklogCommand,
}

#[derive(Subcommand)]
pub enum BacklogCommand {
    /// Add a backlog item
    Add {
        /// Registered project name
        project: String,
        /// Free-form description
        description: String,
    },
    /// Remove a backlog item by id or unambiguous id prefix
    Remove {
        /// Full id or prefix
        id_prefix: String,
    },
}

pub async fn handle(args: BacklogArgs) -> Result<()> {
    match args.command {
        BacklogCommand::Add { project, description } => add(project, description).await,
        BacklogCommand::Remove { id_prefix } => remove(id_prefix).await,
    }
}

async fn add(project: String, description: String) -> Result<()> {
    let socket_path = crate::env::socket_path();
    let timeout = crate::env::request_timeout();
    hopper_client::send_fire_and_forget(
        &socket_path,
        ClientMessage::BacklogAdd { project, description, lode_id: None, ts: None },
        timeout,
    )
    .await?;
    Ok(())
}

/// Resolves `prefix` against the live backlog list before emitting
/// `backlog_remove`, since the wire message itself expects a full item
/// id (spec.md SPEC_FULL.md §3's prefix-resolution supplement is a
/// CLI-side concern, not a coordinator one).
async fn remove(prefix: String) -> Result<()> {
    let socket_path = crate::env::socket_path();
    let timeout = crate::env::request_timeout();

    let reply = hopper_client::connect_oneshot(
        &socket_path,
        ClientMessage::BacklogList { ts: None },
        timeout,
    )
    .await?;

    let items = match reply {
        ServerMessage::BacklogList { items, .. } => items,
        other => bail!("unexpected reply to backlog_list: {}", other.type_name()),
    };

    let item_id = match find_by_prefix(&items, &prefix) {
        PrefixMatch::One(item) => item.id.as_str().to_string(),
        PrefixMatch::None => bail!("no backlog item matches: {prefix}"),
        PrefixMatch::Ambiguous(matches) => bail!(
            "ambiguous prefix {prefix}: matches {}",
            matches
                .iter()
                .map(|item| item.id.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    };

    hopper_client::send_fire_and_forget(
        &socket_path,
        ClientMessage::BacklogRemove { item_id, ts: None },
        timeout,
    )
    .await?;
    Ok(())
}
