// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hopper code <stage>`: runs a stage-specific codex prompt with stdin as
//! the request, resuming the current lode's codex thread (spec.md §6,
//! glossary "Codex thread"). Intended to be invoked by the interactive
//! agent during refine for targeted sub-prompts such as `audit` or
//! `implement`.

use std::io::Read;

use anyhow::{bail, Result};
use hopper_protocol::{ClientMessage, ServerMessage};
use hopper_runner::prompt::{FilePromptRenderer, PromptContext, PromptRenderer};
use hopper_runner::venv;

pub async fn handle(stage: String) -> Result<()> {
    let lode_id = crate::env::current_lode_id().ok_or_else(|| {
        anyhow::anyhow!("HOPPER_LID is not set; `code` must run inside a lode's agent session")
    })?;

    let mut request = String::new();
    std::io::stdin()
        .read_to_string(&mut request)
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
        ServerMessage::Connected { .. } => bail!("unknown lode: {lode_id}"),
        other => bail!("unexpected reply to connect: {}", other.type_name()),
    };

    let Some(codex_thread_id) = lode.codex_thread_id else {
        bail!("lode {lode_id} has no bootstrapped codex thread yet");
    };

    let home = crate::env::home();
    let worktree = hopper_store::paths::lode_worktree(&home, &lode_id);
    let cwd = if worktree.is_dir() { worktree.clone() } else { std::path::PathBuf::from(&lode.project) };
    let extra_env = venv::activation_env(&worktree);

    let prompts_dir = std::env::var("HOPPER_PROMPTS_DIR").ok().map(std::path::PathBuf::from);
    let renderer = FilePromptRenderer::new(prompts_dir);
    let mut context = PromptContext::new();
    context.insert("project".to_string(), lode.project.clone());
    context.insert("dir".to_string(), cwd.display().to_string());
    context.insert("request".to_string(), request.clone());
    let prompt = renderer
        .render(&stage, &context)
        .unwrap_or(request);

    let out_dir = std::env::temp_dir();
    let output_file = out_dir.join(format!("hopper-code-{lode_id}.md"));

    let code = hopper_runner::codex::run_resume(&prompt, &cwd, &output_file, &codex_thread_id, &extra_env)
        .await
        .map_err(|e| anyhow::anyhow!("codex resume failed: {e}"))?;

    if let Ok(output) = std::fs::read_to_string(&output_file) {
        print!("{output}");
    }
    let _ = std::fs::remove_file(&output_file);

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
