// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The coordinator's structured mutation log (spec.md §4.3 "Startup state
//! logging"): a timestamped append-only file under `HOPPER_HOME`, one
//! concise line per mutation. Lives for the coordinator's lifetime;
//! attached in [`crate::server::run`], detached when the guard drops.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Owns the non-blocking file writer's background flush thread. Dropping
/// this stops the activity log (mirrors the daemon's own lifetime, same
/// pattern as the teacher's `processing.log` writer guard).
pub struct ActivityLogGuard {
    _file_guard: WorkerGuard,
}

/// Open `activity.log` and install a `tracing` layer that writes every
/// `target = "hopper::activity"` event to it, one line per mutation.
pub fn install(home: &Path) -> std::io::Result<ActivityLogGuard> {
    std::fs::create_dir_all(home)?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(hopper_store::paths::activity_log(home))?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking.with_filter(|meta| meta.target() == "hopper::activity"))
        .with_ansi(false)
        .with_target(false);

    use tracing_subscriber::layer::SubscriberExt;
    let subscriber = tracing_subscriber::Registry::default().with(layer);
    // Activity events are additionally captured by whatever global
    // subscriber the binary installed (stdout/stderr logging); here we
    // only need a dedicated sink for the file, so this layer is pushed as
    // an additional global default only if the binary hasn't already set one.
    let _ = tracing::subscriber::set_global_default(subscriber);

    Ok(ActivityLogGuard { _file_guard: guard })
}

/// Emit one structured activity line: `component=coordinator lode=<id> change=<text>`.
macro_rules! activity {
    ($lode_id:expr, $($arg:tt)*) => {
        tracing::info!(target: "hopper::activity", lode = %$lode_id, $($arg)*);
    };
}
pub(crate) use activity;
