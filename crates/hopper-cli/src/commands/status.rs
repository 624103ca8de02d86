// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hopper status [-t title] [text...]`: lets the agent running inside a
//! lode's session update its own title and/or status line (spec.md §6).
//! Resolves the target lode from `HOPPER_LID`, the environment variable
//! the runner exports onto the agent subprocess.

use anyhow::Result;
use clap::Args;
use hopper_protocol::ClientMessage;

#[derive(Args)]
pub struct StatusArgs {
    /// Set the lode's title instead of (or in addition to) its status
    #[arg(short = 't', long = "title")]
    pub title: Option<String>,

    /// Status text; joined with spaces if given as multiple words
    pub text: Vec<String>,
}

pub async fn handle(args: StatusArgs) -> Result<()> {
    let lode_id = crate::env::current_lode_id().ok_or_else(|| {
        anyhow::anyhow!("HOPPER_LID is not set; `status` must run inside a lode's agent session")
    })?;

    let socket_path = crate::env::socket_path();
    let timeout = crate::env::request_timeout();

    if let Some(title) = args.title {
        hopper_client::send_fire_and_forget(
            &socket_path,
            ClientMessage::LodeSetTitle { lode_id: lode_id.clone().into(), title, ts: None },
            timeout,
        )
        .await?;
    }

    if !args.text.is_empty() {
        let status = args.text.join(" ");
        hopper_client::send_fire_and_forget(
            &socket_path,
            ClientMessage::LodeSetStatus { lode_id: lode_id.into(), status, ts: None },
            timeout,
        )
        .await?;
    }

    Ok(())
}
