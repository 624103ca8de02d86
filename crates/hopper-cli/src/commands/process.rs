// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hopper process <lode_id>`: run the stage runner for a lode's current
//! stage (spec.md §4.6). This is also what `hopperd`'s `RunnerSpawner`
//! shells out to on auto-advance and on `lode_create --spawn`.

use std::sync::Arc;

use hopper_runner::prompt::FilePromptRenderer;
use hopper_runner::tmux::RealTmuxAdapter;
use hopper_runner::{run_stage, RunnerConfig};

pub async fn handle(lode_id: String) -> ! {
    let cfg = RunnerConfig {
        socket_path: crate::env::socket_path(),
        home: crate::env::home(),
        lode_id,
        tmux: Arc::new(RealTmuxAdapter),
        prompt: Arc::new(FilePromptRenderer::new(prompts_dir())),
        agent_binary: hopper_runner::env::agent_binary(),
    };

    let code = run_stage(cfg).await;
    std::process::exit(code);
}

/// `HOPPER_PROMPTS_DIR` overrides the compiled-in stage prompts, matching
/// the runner's fallback-to-default behavior when unset.
fn prompts_dir() -> Option<std::path::PathBuf> {
    std::env::var("HOPPER_PROMPTS_DIR").ok().map(std::path::PathBuf::from)
}
