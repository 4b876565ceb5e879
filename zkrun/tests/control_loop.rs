//! End-to-end runs of the control loop against an in-memory ensemble

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use zkrun::{ControlLoop, RunContext, EXIT_ERROR, EXIT_SUCCESS};
use zkrun_config::{ExitPolicy, JobSpec};
use zkrun_leader_election::MemoryEnsemble;
use zkrun_shell::SpawnOptions;

fn context(job: JobSpec) -> RunContext {
    RunContext::new("/", "dc1", "nightly", job, SpawnOptions::inherit())
        .expect("Context must be valid")
}

fn control_loop(ensemble: &MemoryEnsemble, job: JobSpec) -> ControlLoop {
    ControlLoop::new(Arc::new(ensemble.connect()), context(job))
}

fn append(path: &Path, word: &str) -> String {
    format!("/bin/sh -c 'echo {} >> {}'", word, path.display())
}

fn lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test_log::test(tokio::test)]
async fn test_true_under_terminate_exits_zero() {
    let ensemble = MemoryEnsemble::new();
    let job = JobSpec::new("/bin/true", ExitPolicy::Terminate)
        .with_start_success_delay(Duration::from_millis(100));

    assert_eq!(control_loop(&ensemble, job).run().await, EXIT_SUCCESS);
    assert!(ensemble.children_of("/zkrun/dc1/nightly/lock").is_empty());
    assert!(!ensemble.contains("/zkrun/dc1/nightly/active"));
}

#[test_log::test(tokio::test)]
async fn test_false_under_terminate_exits_one() {
    let ensemble = MemoryEnsemble::new();
    let job = JobSpec::new("/bin/false", ExitPolicy::Terminate)
        .with_start_success_delay(Duration::from_millis(100));

    assert_eq!(control_loop(&ensemble, job).run().await, EXIT_ERROR);
}

#[test_log::test(tokio::test)]
async fn test_run_command_notifies_once_on_fault() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("notify.log");
    let ensemble = MemoryEnsemble::new();
    let job = JobSpec::new("/bin/false", ExitPolicy::RunCommand)
        .with_after_exit_failure(vec![append(&log, "notify-fail")]);

    assert_eq!(control_loop(&ensemble, job).run().await, EXIT_ERROR);
    assert_eq!(lines(&log), ["notify-fail"]);
}

#[test_log::test(tokio::test)]
async fn test_terminate_never_runs_failure_hooks() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("hooks.log");
    let ensemble = MemoryEnsemble::new();
    let job = JobSpec::new("/bin/false", ExitPolicy::Terminate)
        .with_after_exit_failure(vec![append(&log, "failed")])
        .with_after_exit_always(vec![append(&log, "always")]);

    assert_eq!(control_loop(&ensemble, job).run().await, EXIT_ERROR);
    assert_eq!(lines(&log), ["always"]);
}

#[test_log::test(tokio::test)]
async fn test_reacquire_lock_keeps_contending() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("runs.log");
    let ensemble = MemoryEnsemble::new();
    let job = JobSpec::new(
        format!("/bin/sh -c 'echo run >> {}; exit 1'", log.display()),
        ExitPolicy::ReacquireLock,
    )
    .with_after_exit_always(vec![append(&log, "always")]);

    let code = control_loop(&ensemble, job).with_max_rounds(3).run().await;
    assert_eq!(code, EXIT_SUCCESS);
    assert_eq!(
        lines(&log),
        ["run", "always", "run", "always", "run", "always"]
    );
    assert!(ensemble.children_of("/zkrun/dc1/nightly/lock").is_empty());
}

#[test_log::test(tokio::test)]
async fn test_lost_session_exits_one() {
    let ensemble = MemoryEnsemble::new();
    let session = ensemble.connect();
    session.expire();
    let job = JobSpec::new("/bin/true", ExitPolicy::ReacquireLock);

    let code = ControlLoop::new(Arc::new(session), context(job))
        .with_max_rounds(3)
        .run()
        .await;
    assert_eq!(code, EXIT_ERROR);
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 2))]
async fn test_instances_never_overlap() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("overlap.log");
    let ensemble = MemoryEnsemble::new();
    let command = format!(
        "/bin/sh -c 'echo begin >> {0}; sleep 0.2; echo end >> {0}'",
        log.display()
    );

    let instances: Vec<_> = (0..3)
        .map(|_| {
            let job = JobSpec::new(command.clone(), ExitPolicy::Terminate);
            let control_loop = control_loop(&ensemble, job);
            tokio::spawn(async move { control_loop.run().await })
        })
        .collect();

    for instance in instances {
        assert_eq!(instance.await.unwrap(), EXIT_SUCCESS);
    }
    assert_eq!(
        lines(&log),
        ["begin", "end", "begin", "end", "begin", "end"]
    );
}

#[test_log::test(tokio::test)]
async fn test_stale_active_marker_pauses_reacquire_loop() {
    use zkrun_leader_election::{CoordinationClient, NodeMode};

    let temp = TempDir::new().unwrap();
    let log = temp.path().join("runs.log");
    let ensemble = MemoryEnsemble::new();
    let job = JobSpec::new(
        format!("/bin/sh -c 'echo run >> {}'", log.display()),
        ExitPolicy::ReacquireLock,
    );
    let control_loop = control_loop(&ensemble, job).with_max_rounds(3);

    // a previous leader whose session has not expired yet
    let stale = ensemble.connect();
    for path in ["/zkrun", "/zkrun/dc1", "/zkrun/dc1/nightly"] {
        stale.create(path, NodeMode::Persistent).await.unwrap();
    }
    stale
        .create("/zkrun/dc1/nightly/active", NodeMode::Ephemeral)
        .await
        .unwrap();

    let running = tokio::spawn(async move { control_loop.run().await });
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!running.is_finished(), "Rounds must not be spent while the marker is held");
    assert!(lines(&log).is_empty());

    stale.expire();
    let code = tokio::time::timeout(Duration::from_secs(10), running)
        .await
        .expect("Loop must resume once the marker is gone")
        .unwrap();
    assert_eq!(code, EXIT_SUCCESS);
    assert_eq!(lines(&log), ["run", "run"]);
}
