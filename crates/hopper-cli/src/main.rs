// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hopper` — the lode orchestrator's CLI (spec.md §6).

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod commands;
mod daemon_process;
mod env;

use clap::{Parser, Subcommand};
use commands::{backlog, code, config, lode, project, status};

#[derive(Parser)]
#[command(name = "hopper", version, about = "Hopper - a lode orchestrator for long-lived coding-agent sessions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the daemon if it isn't already running
    Up,
    /// Connect to the daemon and print `pong`
    Ping,
    /// Run the stage runner for a lode's current stage
    Process {
        /// Lode id
        lode_id: String,
    },
    /// Signal that the current stage's agent has finished; reads stdout
    /// from stdin and writes it as the stage's output artifact
    Processed,
    /// Set the current lode's title and/or status line
    Status(status::StatusArgs),
    /// Lode management
    Lode(lode::LodeArgs),
    /// Backlog management
    Backlog(backlog::BacklogArgs),
    /// Project management
    Project(project::ProjectArgs),
    /// Configuration key/value store
    Config(config::ConfigArgs),
    /// Capture the invoking tmux pane
    Screenshot,
    /// Run a stage-specific codex prompt with stdin as the request
    Code {
        /// Prompt name (e.g. `audit`, `implement`)
        stage: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Up => commands::up::handle().await,
        Commands::Ping => commands::ping::handle().await,
        Commands::Process { lode_id } => commands::process::handle(lode_id).await,
        Commands::Processed => commands::processed::handle().await,
        Commands::Status(args) => status::handle(args).await,
        Commands::Lode(args) => lode::handle(args).await,
        Commands::Backlog(args) => backlog::handle(args).await,
        Commands::Project(args) => project::handle(args).await,
        Commands::Config(args) => config::handle(args).await,
        Commands::Screenshot => commands::screenshot::handle().await,
        Commands::Code { stage } => code::handle(stage).await,
    }
}
