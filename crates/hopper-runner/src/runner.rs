// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The run lifecycle (spec.md §4.6): handshake, load state, open the
//! persistent connection, validate stage preconditions, spawn the agent,
//! monitor its pane, watch for the done signal, and auto-dismiss.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hopper_core::{ClaudeStage, LodeId, Stage};
use hopper_protocol::{ClientMessage, ServerMessage};
use hopper_store::paths;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::dismiss::DismissHandle;
use crate::env::{exit_poll_interval, handshake_timeout};
use crate::error::RunnerError;
use crate::monitor::MonitorHandle;
use crate::prompt::{PromptContext, PromptRenderer};
use crate::tmux::TmuxAdapter;
use crate::{codex, dismiss, git, monitor, stage, venv};

/// Everything a stage run needs from the outside world. Constructed once
/// per invocation by `hopper-cli`'s `process` command.
pub struct RunnerConfig {
    pub socket_path: PathBuf,
    pub home: PathBuf,
    pub lode_id: String,
    pub tmux: Arc<dyn TmuxAdapter>,
    pub prompt: Arc<dyn PromptRenderer>,
    pub agent_binary: String,
}

/// Run one stage to completion (the agent exits, one way or another).
/// Always attempts a final `lode_set_state error, …` emit on an
/// unrecoverable failure before returning the process exit code, per
/// spec.md §7's propagation policy.
pub async fn run_stage(cfg: RunnerConfig) -> i32 {
    match run_inner(&cfg).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err}");
            err.exit_code()
        }
    }
}

async fn run_inner(cfg: &RunnerConfig) -> Result<i32, RunnerError> {
    let lode_id = LodeId::new(cfg.lode_id.clone());

    // Step 1: handshake. Read-only; does not claim ownership.
    let reply = hopper_client::connect_oneshot(
        &cfg.socket_path,
        ClientMessage::Connect {
            lode_id: Some(lode_id.clone()),
            ts: None,
        },
        handshake_timeout(),
    )
    .await
    .map_err(|e| RunnerError::Handshake(e.to_string()))?;

    let lode = match reply {
        ServerMessage::Connected {
            lode: Some(lode),
            lode_found: Some(true),
            ..
        } => lode,
        ServerMessage::Connected { .. } => return Err(RunnerError::LodeNotFound),
        _ => return Err(RunnerError::Handshake("unexpected reply to connect".into())),
    };

    if lode.active {
        return Err(RunnerError::AlreadyOwned);
    }
    if lode.stage == Stage::Shipped {
        return Err(RunnerError::Precondition("lode is already shipped".into()));
    }

    let stage = lode.stage;
    let stage_cfg = stage::config_for(stage);

    // Step 2: load state — project path and this stage's session identity.
    let store_config = hopper_store::Config::load(&cfg.home)
        .map_err(|e| RunnerError::Precondition(format!("failed to load config: {e}")))?;
    let project = store_config
        .projects
        .iter()
        .find(|p| p.name == lode.project)
        .ok_or_else(|| RunnerError::Precondition(format!("unknown project: {}", lode.project)))?;
    let project_dir = PathBuf::from(&project.path);

    let claude_entry: ClaudeStage = lode
        .claude
        .get(stage)
        .cloned()
        .ok_or_else(|| RunnerError::Precondition(format!("no session identity for stage {stage}")))?;
    let is_first_run = !claude_entry.started;
    let session_id = claude_entry.session_id;

    // Step 3: open the persistent connection. `pane_cell`/`pid` let the
    // on_connect hook re-send an up-to-date register after a reconnect.
    let pane_cell: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let handle_cell: Arc<Mutex<Option<hopper_client::PersistentConnectionHandle>>> =
        Arc::new(Mutex::new(None));
    let pid = std::process::id();

    let done = Arc::new(AtomicBool::new(false));
    let done_notify = Arc::new(Notify::new());
    let lode_id_for_msg = lode_id.clone();
    let done_for_msg = Arc::clone(&done);
    let notify_for_msg = Arc::clone(&done_notify);
    let on_message = move |msg: ServerMessage| {
        if msg.lode_reached_completed(&lode_id_for_msg) {
            done_for_msg.store(true, Ordering::SeqCst);
            notify_for_msg.notify_one();
        }
    };

    let lode_id_for_hook = lode_id.clone();
    let handle_cell_for_hook = Arc::clone(&handle_cell);
    let pane_cell_for_hook = Arc::clone(&pane_cell);
    let on_connect = move || {
        if let Some(handle) = handle_cell_for_hook.lock().as_ref() {
            let pane = pane_cell_for_hook.lock().clone();
            handle.emit(ClientMessage::LodeRegister {
                lode_id: lode_id_for_hook.clone(),
                tmux_pane: pane,
                pid: Some(pid),
                ts: None,
            });
        }
    };

    let conn = hopper_client::PersistentConnection::spawn(cfg.socket_path.clone(), on_connect, on_message);
    *handle_cell.lock() = Some(conn.handle());
    let handle = conn.handle();

    let result = run_stage_body(
        cfg,
        &lode_id,
        stage,
        &stage_cfg,
        &project_dir,
        is_first_run,
        session_id,
        lode.scope.clone(),
        lode.codex_thread_id.clone(),
        &pane_cell,
        &handle,
        &done,
        &done_notify,
    )
    .await;

    if let Err(err) = &result {
        handle.emit(ClientMessage::LodeSetState {
            lode_id: lode_id.clone(),
            state: "error".to_string(),
            status: err.to_string(),
            ts: None,
        });
    }

    conn.stop().await;
    result
}

#[allow(clippy::too_many_arguments)]
async fn run_stage_body(
    cfg: &RunnerConfig,
    lode_id: &LodeId,
    stage: Stage,
    stage_cfg: &stage::StageConfig,
    project_dir: &std::path::Path,
    is_first_run: bool,
    session_id: uuid::Uuid,
    scope: String,
    codex_thread_id: Option<String>,
    pane_cell: &Arc<Mutex<Option<String>>>,
    handle: &hopper_client::PersistentConnectionHandle,
    done: &Arc<AtomicBool>,
    done_notify: &Arc<Notify>,
) -> Result<i32, RunnerError> {
    // Step 4: stage setup — preconditions, input artifact, cwd, extra env.
    let setup = match stage {
        Stage::Mill => setup_mill(&cfg.home, lode_id.as_str(), &scope, project_dir).await?,
        Stage::Refine => {
            setup_refine(
                &cfg.home,
                lode_id.as_str(),
                &scope,
                project_dir,
                codex_thread_id,
                handle,
                lode_id,
            )
            .await?
        }
        Stage::Ship => setup_ship(&cfg.home, lode_id.as_str(), project_dir).await?,
        Stage::Shipped => unreachable!("guarded in run_inner"),
    };

    // Step 5: spawn the agent.
    let mut context = PromptContext::new();
    context.insert("project".to_string(), project_dir.display().to_string());
    context.insert("dir".to_string(), setup.cwd.display().to_string());
    context.insert("scope".to_string(), scope.clone());
    context.insert("input".to_string(), setup.input.clone());

    let command = if is_first_run {
        let prompt = cfg
            .prompt
            .render(stage_cfg.prompt_name, &context)
            .map_err(|e| RunnerError::Precondition(format!("prompt render failed: {e}")))?;
        format!(
            "{} --session-id {} {}",
            cfg.agent_binary,
            session_id,
            shell_quote(&prompt)
        )
    } else {
        format!("{} --resume {}", cfg.agent_binary, session_id)
    };

    let mut spawn_env = setup.extra_env.clone();
    spawn_env.push(("HOPPER_LID".to_string(), lode_id.as_str().to_string()));

    let pane = cfg
        .tmux
        .spawn(lode_id.as_str(), &setup.cwd, &command, &spawn_env)
        .await
        .map_err(|e| RunnerError::Precondition(format!("failed to spawn agent: {e}")))?;
    *pane_cell.lock() = Some(pane.clone());
    handle.emit(ClientMessage::LodeRegister {
        lode_id: lode_id.clone(),
        tmux_pane: Some(pane.clone()),
        pid: Some(std::process::id()),
        ts: None,
    });
    handle.emit(ClientMessage::LodeSetState {
        lode_id: lode_id.clone(),
        state: "running".to_string(),
        status: "Claude running".to_string(),
        ts: None,
    });

    // Step 6: activity monitor.
    let handle_for_monitor = handle.clone();
    let monitor: MonitorHandle = monitor::spawn(
        Arc::clone(&cfg.tmux),
        pane.clone(),
        lode_id.as_str().to_string(),
        move |msg| handle_for_monitor.emit(msg),
    );

    // Step 7: optional auto-dismiss watcher.
    let dismiss: Option<DismissHandle> = if stage_cfg.always_dismiss || is_first_run {
        Some(dismiss::spawn(Arc::clone(&cfg.tmux), pane.clone()))
    } else {
        None
    };

    // Step 8: wait for exit, watching for the done signal concurrently.
    let exit_code = wait_for_exit(cfg.tmux.as_ref(), &pane, done, done_notify, dismiss.as_ref()).await;

    monitor.stop().await;
    if let Some(dismiss) = dismiss {
        dismiss.stop().await;
    }

    let exit_code = exit_code.map_err(|e| RunnerError::Precondition(format!("agent exit detection failed: {e}")))?;
    let observed_done = done.load(Ordering::SeqCst);

    match exit_code {
        0 if observed_done => {
            handle.emit(ClientMessage::LodeSetState {
                lode_id: lode_id.clone(),
                state: "ready".to_string(),
                status: hopper_core::lode::done_status_for(stage).to_string(),
                ts: None,
            });
            handle.emit(ClientMessage::LodeSetStage {
                lode_id: lode_id.clone(),
                stage: stage_cfg.next_stage,
                ts: None,
            });
        }
        0 => {
            // The agent exited cleanly without the done signal: the user
            // dismissed it themselves. No stage-wise state change.
        }
        127 => {
            handle.emit(ClientMessage::LodeSetState {
                lode_id: lode_id.clone(),
                state: "error".to_string(),
                status: "command not found".to_string(),
                ts: None,
            });
        }
        130 => {
            // User interrupt: no state change.
        }
        other => {
            let tail = last_lines(&cfg.tmux.capture(&pane).await.unwrap_or_default(), 5);
            handle.emit(ClientMessage::LodeSetState {
                lode_id: lode_id.clone(),
                state: "error".to_string(),
                status: tail,
                ts: None,
            });
            let _ = other;
        }
    }

    if is_first_run && exit_code != 127 {
        handle.emit(ClientMessage::LodeSetClaudeStarted {
            lode_id: lode_id.clone(),
            claude_stage: stage,
            ts: None,
        });
    }

    Ok(exit_code)
}

async fn wait_for_exit(
    tmux: &dyn TmuxAdapter,
    pane: &str,
    done: &Arc<AtomicBool>,
    done_notify: &Arc<Notify>,
    dismiss: Option<&DismissHandle>,
) -> Result<i32, crate::tmux::TmuxError> {
    let mut signalled = false;
    loop {
        if let Some(code) = tmux.exit_code(pane).await? {
            return Ok(code);
        }
        if !signalled && done.load(Ordering::SeqCst) {
            signalled = true;
            if let Some(dismiss) = dismiss {
                dismiss.signal_done();
            }
        }
        tokio::select! {
            _ = done_notify.notified(), if !signalled => {
                signalled = true;
                if let Some(dismiss) = dismiss {
                    dismiss.signal_done();
                }
            }
            _ = tokio::time::sleep(exit_poll_interval()) => {}
        }
    }
}

struct StageSetup {
    cwd: PathBuf,
    input: String,
    extra_env: Vec<(String, String)>,
}

async fn setup_mill(
    home: &std::path::Path,
    lode_id: &str,
    scope: &str,
    project_dir: &std::path::Path,
) -> Result<StageSetup, RunnerError> {
    let _ = paths::lode_stage_out(home, lode_id, "mill"); // artifact location, written by `processed`
    Ok(StageSetup {
        cwd: project_dir.to_path_buf(),
        input: scope.to_string(),
        extra_env: Vec::new(),
    })
}

#[allow(clippy::too_many_arguments)]
async fn setup_refine(
    home: &std::path::Path,
    lode_id: &str,
    _scope: &str,
    project_dir: &std::path::Path,
    codex_thread_id: Option<String>,
    handle: &hopper_client::PersistentConnectionHandle,
    lode_id_typed: &LodeId,
) -> Result<StageSetup, RunnerError> {
    let mill_out = paths::lode_stage_out(home, lode_id, "mill");
    let input = std::fs::read_to_string(&mill_out).map_err(|_| {
        RunnerError::Precondition(format!("missing mill output: {}", mill_out.display()))
    })?;

    let worktree = paths::lode_worktree(home, lode_id);
    if !worktree.is_dir() {
        let branch = format!("hopper-{lode_id}");
        if !git::create_worktree(project_dir, &worktree, &branch).await {
            return Err(RunnerError::Precondition(format!(
                "failed to create worktree at {}",
                worktree.display()
            )));
        }
    }

    if !venv::ensure_installed(&worktree).await {
        return Err(RunnerError::Precondition("make install failed in worktree".into()));
    }
    let extra_env = venv::activation_env(&worktree);

    if codex_thread_id.is_none() {
        let prompt = "Audit the mill output and prepare to implement it.";
        match codex::bootstrap(prompt, &worktree, &extra_env).await {
            Ok(thread_id) => {
                handle.emit(ClientMessage::LodeSetCodexThread {
                    lode_id: lode_id_typed.clone(),
                    codex_thread_id: thread_id,
                    ts: None,
                });
            }
            Err(err) => {
                return Err(RunnerError::CodexBootstrap(err.to_string()));
            }
        }
    }

    Ok(StageSetup {
        cwd: worktree,
        input,
        extra_env,
    })
}

async fn setup_ship(
    home: &std::path::Path,
    lode_id: &str,
    project_dir: &std::path::Path,
) -> Result<StageSetup, RunnerError> {
    let refine_out = paths::lode_stage_out(home, lode_id, "refine");
    let input = std::fs::read_to_string(&refine_out).map_err(|_| {
        RunnerError::Precondition(format!("missing refine output: {}", refine_out.display()))
    })?;

    let worktree = paths::lode_worktree(home, lode_id);
    if !worktree.is_dir() {
        return Err(RunnerError::Precondition(format!(
            "worktree does not exist: {}",
            worktree.display()
        )));
    }

    if git::is_dirty(project_dir).await {
        return Err(RunnerError::Precondition(
            "Project repo has uncommitted changes: refusing to ship".to_string(),
        ));
    }
    match git::current_branch(project_dir).await.as_deref() {
        Some("main") | Some("master") => {}
        _ => {
            return Err(RunnerError::Precondition(
                "project repo is not on main or master".to_string(),
            ));
        }
    }

    let numstat = git::diff_numstat(&worktree).await;
    let _ = std::fs::write(paths::lode_diff_txt(home, lode_id), numstat);

    Ok(StageSetup {
        cwd: project_dir.to_path_buf(),
        input,
        extra_env: Vec::new(),
    })
}

/// Last `n` non-empty lines of `text`, joined with `\n` — used for the
/// error status on a nonzero agent exit (spec.md §7: "extract the last 5
/// stderr lines"). The pane capture stands in for stderr since the agent
/// runs inside the tmux pane rather than as a directly-piped child.
fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

/// Single-quote a string for embedding in a shell command line, escaping
/// any embedded single quotes.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}
