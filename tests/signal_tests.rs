//! Signal handling of the shell binary
//!
//! The binary must exit on SIGINT or SIGTERM even while stdin stays open
//! with no input pending.
#![cfg(unix)]

use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

// == Helper Functions ==

fn spawn_shell(dir: &std::path::Path) -> Child {
    Command::new(env!("CARGO_BIN_EXE_cache_engine"))
        .current_dir(dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap()
}

fn send_signal(child: &Child, name: &str) {
    let status = Command::new("kill")
        .arg(format!("-{name}"))
        .arg(child.id().to_string())
        .status()
        .unwrap();
    assert!(status.success());
}

/// Polls until the child exits or `timeout` passes.
fn exited_within(child: &mut Child, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if child.try_wait().unwrap().is_some() {
            return true;
        }
        thread::sleep(Duration::from_millis(50));
    }
    false
}

fn assert_exits_on(name: &str) {
    let dir = tempfile::tempdir().unwrap();
    let mut child = spawn_shell(dir.path());
    // Held open so the shell keeps waiting on stdin
    let _stdin = child.stdin.take();

    thread::sleep(Duration::from_millis(500));
    send_signal(&child, name);

    let exited = exited_within(&mut child, Duration::from_secs(5));
    if !exited {
        let _ = child.kill();
        let _ = child.wait();
    }
    assert!(exited, "shell still running 5s after SIG{name}");
}

#[test]
fn test_exits_on_sigint_with_idle_stdin() {
    assert_exits_on("INT");
}

#[test]
fn test_exits_on_sigterm_with_idle_stdin() {
    assert_exits_on("TERM");
}
