//! Test helpers for behavioral specifications.
//!
//! Provides a high-level DSL for testing `hopper`/`hopperd` behavior,
//! shaped after the teacher's CLI-only, assert_cmd-driven spec harness.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};

const HOPPER_REQUEST_TIMEOUT_MS: &str = "2000";
const HOPPER_START_TIMEOUT_MS: &str = "2000";
const HOPPER_START_POLL_MS: &str = "10";

pub const SPEC_POLL_INTERVAL_MS: u64 = 10;
pub const SPEC_WAIT_MAX_MS: u64 = 2000;

/// Returns the path to a binary, checking the llvm-cov target directory
/// first, falling back to resolving relative to the test binary itself
/// when `CARGO_MANIFEST_DIR` is stale.
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug").join(name);
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

fn hopper_binary() -> PathBuf {
    binary_path("hopper")
}

pub fn hopperd_binary() -> PathBuf {
    binary_path("hopperd")
}

fn hopper_cmd() -> Command {
    Command::new(hopper_binary())
}

/// Create a CLI builder for `hopper` commands.
pub fn cli() -> CliBuilder {
    CliBuilder::new()
}

/// High-level CLI builder for fluent test assertions.
pub struct CliBuilder {
    args: Vec<String>,
    dir: Option<PathBuf>,
    envs: Vec<(String, String)>,
}

impl CliBuilder {
    fn new() -> Self {
        Self {
            args: Vec::new(),
            dir: None,
            envs: vec![
                (
                    "HOPPER_DAEMON_BINARY".into(),
                    hopperd_binary().to_string_lossy().into(),
                ),
                ("HOPPER_REQUEST_TIMEOUT_MS".into(), HOPPER_REQUEST_TIMEOUT_MS.into()),
                ("HOPPER_START_TIMEOUT_MS".into(), HOPPER_START_TIMEOUT_MS.into()),
                ("HOPPER_START_POLL_MS".into(), HOPPER_START_POLL_MS.into()),
            ],
        }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn pwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.dir = Some(path.into());
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<Path>) -> Self {
        self.envs.push((key.to_string(), value.as_ref().to_string_lossy().to_string()));
        self
    }

    pub fn command(self) -> Command {
        let mut cmd = hopper_cmd();
        cmd.args(&self.args);
        if let Some(dir) = self.dir {
            cmd.current_dir(dir);
        }
        for (key, value) in self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    pub fn passes(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("command should run");
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    pub fn fails(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("command should run");
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

/// Result of a CLI run for chaining assertions.
pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn code(&self) -> Option<i32> {
        self.output.status.code()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(stdout.contains(expected), "stdout does not contain '{expected}'\nstdout: {stdout}");
        self
    }

    pub fn stdout_eq(self, expected: &str) -> Self {
        let stdout = self.stdout();
        similar_asserts::assert_eq!(stdout, expected);
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(stderr.contains(expected), "stderr does not contain '{expected}'\nstderr: {stderr}");
        self
    }
}

/// Poll a condition until it returns true or the timeout is reached.
pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    let timeout = Duration::from_millis(timeout_ms);
    let poll_interval = Duration::from_millis(SPEC_POLL_INTERVAL_MS);
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(poll_interval);
    }
    false
}

/// A temporary `HOPPER_HOME` plus a running `hopperd` bound to it.
///
/// Spawns the daemon directly (rather than through `hopper up`) so tests
/// can send it a graceful SIGTERM or a hard kill independent of the CLI.
pub struct Daemon {
    home: tempfile::TempDir,
    child: Child,
}

impl Daemon {
    /// Start a fresh daemon over an empty `HOPPER_HOME`.
    pub fn start() -> Self {
        let home = tempfile::tempdir().unwrap();
        let child = Command::new(hopperd_binary())
            .env("HOPPER_HOME", home.path())
            .env("RUST_LOG", "error")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("hopperd should spawn");

        let socket = home.path().join("server.sock");
        let connected = wait_for(SPEC_WAIT_MAX_MS, || std::os::unix::net::UnixStream::connect(&socket).is_ok());
        assert!(connected, "hopperd did not start accepting connections in time");

        Self { home, child }
    }

    pub fn home(&self) -> &Path {
        self.home.path()
    }

    /// Run a `hopper` command scoped to this daemon's `HOPPER_HOME`.
    pub fn hopper(&self) -> CliBuilder {
        cli().env("HOPPER_HOME", self.home())
    }

    /// Send SIGTERM and wait for the process to exit, simulating the
    /// graceful-shutdown path (spec.md §5).
    pub fn stop_gracefully(&mut self) {
        let _ = Command::new("kill")
            .args(["-TERM", &self.child.id().to_string()])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        let _ = self.child.wait();
    }

    /// SIGKILL, simulating a daemon crash (no graceful socket cleanup).
    pub fn kill(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// A scratch project directory registered with a `Daemon`'s config.
pub struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self { dir: tempfile::tempdir().unwrap() }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn name(&self) -> String {
        self.dir.path().file_name().unwrap().to_string_lossy().into_owned()
    }

    pub fn git_init(&self) {
        Command::new("git")
            .args(["init", "-q", "-b", "main"])
            .current_dir(self.path())
            .status()
            .expect("git init should work");
        Command::new("git")
            .args(["config", "user.email", "spec@example.test"])
            .current_dir(self.path())
            .status()
            .unwrap();
        Command::new("git")
            .args(["config", "user.name", "spec"])
            .current_dir(self.path())
            .status()
            .unwrap();
    }

    pub fn commit_all(&self, message: &str) {
        Command::new("git").args(["add", "-A"]).current_dir(self.path()).status().unwrap();
        Command::new("git")
            .args(["commit", "-q", "-m", message])
            .current_dir(self.path())
            .status()
            .unwrap();
    }

    pub fn file(&self, path: impl AsRef<Path>, content: &str) {
        let full_path = self.dir.path().join(path.as_ref());
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full_path, content).unwrap();
    }
}
