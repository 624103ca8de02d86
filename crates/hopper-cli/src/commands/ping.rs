// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hopper ping`: connect and print `pong`.

use hopper_protocol::{ClientMessage, ServerMessage};

pub async fn handle() -> anyhow::Result<()> {
    let reply = hopper_client::connect_oneshot(
        &crate::env::socket_path(),
        ClientMessage::Ping { ts: None },
        crate::env::request_timeout(),
    )
    .await?;

    match reply {
        ServerMessage::Pong { .. } => {
            println!("pong");
            Ok(())
        }
        other => anyhow::bail!("unexpected reply to ping: {}", other.type_name()),
    }
}
