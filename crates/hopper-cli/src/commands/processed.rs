// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hopper processed`: the runner's done signal (spec.md §4.6 "The done
//! signal"). Reads the agent's final output from stdin, writes it as the
//! current stage's output artifact, and flips the lode to `completed` so
//! every observer (including the owning runner's persistent connection)
//! sees the stage finish at once.

use std::io::Read;

use hopper_protocol::{ClientMessage, ServerMessage};

pub async fn handle() -> anyhow::Result<()> {
    let lode_id = crate::env::current_lode_id()
        .ok_or_else(|| anyhow::anyhow!("HOPPER_LID is not set; `processed` must run inside a lode's agent session"))?;

    let mut body = String::new();
    std::io::stdin()
        .read_to_string(&mut body)
        .map_err(|e| anyhow::anyhow!("failed to read stdin: {e}"))?;

    let socket_path = crate::env::socket_path();
    let timeout = crate::env::request_timeout();

    let reply = hopper_client::connect_oneshot(
        &socket_path,
        ClientMessage::Connect { lode_id: Some(lode_id.clone().into()), ts: None },
        timeout,
    )
    .await?;

    let lode = match reply {
        ServerMessage::Connected { lode: Some(lode), lode_found: Some(true), .. } => lode,
        ServerMessage::Connected { .. } => anyhow::bail!("unknown lode: {lode_id}"),
        other => anyhow::bail!("unexpected reply to connect: {}", other.type_name()),
    };

    let out_path = hopper_store::paths::lode_stage_out(&crate::env::home(), &lode_id, lode.stage.as_str());
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&out_path, &body)
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", out_path.display()))?;

    hopper_client::send_fire_and_forget(
        &socket_path,
        ClientMessage::LodeSetState {
            lode_id: lode_id.into(),
            state: "completed".to_string(),
            status: hopper_core::lode::done_status_for(lode.stage).to_string(),
            ts: None,
        },
        timeout,
    )
    .await?;

    Ok(())
}
