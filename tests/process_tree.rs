// tests/process_tree.rs

#![cfg(unix)]

use teststream_test_utils::init_tracing;

use std::error::Error;
use std::path::Path;
use std::time::{Duration, Instant};

use nix::sys::signal::kill;
use nix::unistd::Pid;

use teststream::exec::{ProcessOutcome, ProcessSpawner, ShellProcessSpawner};

type TestResult = Result<(), Box<dyn Error>>;

/// Starts a background child, records its pid, and waits on it, the way a
/// watch runner keeps its test host alive.
const RUNNER_WITH_CHILD: &str = "sleep 30 & echo $! > child.pid; wait";

async fn read_child_pid(dir: &Path) -> i32 {
    let file = dir.join("child.pid");
    for _ in 0..100 {
        if let Ok(text) = tokio::fs::read_to_string(&file).await {
            if let Ok(pid) = text.trim().parse() {
                return pid;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("runner never wrote {}", file.display());
}

/// Zombies still answer `kill(pid, 0)`; they count as gone.
fn is_alive(pid: i32) -> bool {
    if kill(Pid::from_raw(pid), None).is_err() {
        return false;
    }
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        Ok(stat) => stat
            .rsplit_once(')')
            .and_then(|(_, rest)| rest.split_whitespace().next())
            .is_some_and(|state| state != "Z"),
        Err(_) => true,
    }
}

async fn wait_until_gone(pid: i32) -> bool {
    for _ in 0..100 {
        if !is_alive(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn terminate_stops_processes_started_by_the_runner() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let spawner = ShellProcessSpawner::new();
    let mut handle = spawner.spawn(RUNNER_WITH_CHILD, dir.path())?;

    let child = read_child_pid(dir.path()).await;
    assert!(is_alive(child));

    assert_eq!(handle.terminate().await, ProcessOutcome::Terminated);
    assert!(!handle.is_running());
    assert!(
        wait_until_gone(child).await,
        "child {child} of the runner survived termination"
    );
    Ok(())
}

#[tokio::test]
async fn runner_ignoring_sigterm_is_killed_after_the_grace_period() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let grace = Duration::from_millis(200);
    let spawner = ShellProcessSpawner::new().with_terminate_grace(grace);
    let mut handle = spawner.spawn(&format!("trap '' TERM; {RUNNER_WITH_CHILD}"), dir.path())?;

    let child = read_child_pid(dir.path()).await;

    let started = Instant::now();
    assert_eq!(handle.terminate().await, ProcessOutcome::Terminated);
    let elapsed = started.elapsed();

    assert!(elapsed >= grace, "gave up before the grace period: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "termination hung: {elapsed:?}");
    assert!(
        wait_until_gone(child).await,
        "child {child} ignoring SIGTERM survived termination"
    );
    Ok(())
}

#[tokio::test]
async fn natural_exit_is_reported_with_its_code() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let handle = ShellProcessSpawner::new().spawn("exit 3", dir.path())?;

    assert_eq!(handle.exited().await, ProcessOutcome::Exited(3));
    Ok(())
}
