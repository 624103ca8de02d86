//! Start/stop and socket lifecycle (spec.md §4.2, §5, scenario 6).

use crate::prelude::Daemon;

#[test]
fn ping_succeeds_against_a_running_daemon() {
    let daemon = Daemon::start();
    daemon.hopper().args(&["ping"]).passes().stdout_eq("pong\n");
}

#[test]
fn graceful_stop_removes_the_socket_file() {
    let mut daemon = Daemon::start();
    let socket = daemon.home().join("server.sock");
    assert!(socket.exists());

    daemon.stop_gracefully();

    assert!(!socket.exists(), "socket file should be unlinked on graceful stop");
}

#[test]
fn ping_fails_once_the_daemon_has_stopped() {
    let mut daemon = Daemon::start();
    daemon.stop_gracefully();

    daemon
        .hopper()
        .env("HOPPER_REQUEST_TIMEOUT_MS", "200")
        .args(&["ping"])
        .fails();
}

#[test]
fn a_second_daemon_over_the_same_home_fails_to_acquire_the_lock() {
    let daemon = Daemon::start();

    let mut second = std::process::Command::new(crate::prelude::hopperd_binary())
        .env("HOPPER_HOME", daemon.home())
        .env("RUST_LOG", "error")
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .expect("second hopperd should spawn");

    let status = second.wait().expect("second hopperd should exit");
    assert!(!status.success(), "a second daemon over the same HOPPER_HOME must refuse to start");
}
