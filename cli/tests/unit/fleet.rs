//! Fleet fan-out, cancellation, and start-of-run cleanup.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use tokio_util::sync::CancellationToken;

use swarm_cli::application::services::fleet::{clean_up_instances, prepare, run_fleet};
use swarm_cli::domain::{CleanupMode, FleetOutcome, SwarmConfig, WorkerHandle};

use crate::helpers::{TYPE, artifacts, config, store};
use crate::mocks::{Run, ScriptedBackend};

#[tokio::test]
async fn test_interrupt_stops_every_session_without_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let cancel = CancellationToken::new();
    let backend = ScriptedBackend::default().interrupt_after(9, &cancel);

    let report = run_fleet(&backend, &store(dir.path()), &config(3, dir.path()), &cancel)
        .await
        .unwrap();

    assert_eq!(report.launched, 3);
    assert_eq!(report.cancelled, 3);
    assert_eq!(report.outcome(), FleetOutcome::Clean);
    assert_eq!(backend.created().len(), 3);
    assert!(artifacts(dir.path()).is_empty());
}

#[tokio::test]
async fn test_run_failing_after_interrupt_counts_as_cancelled() {
    let dir = tempfile::tempdir().unwrap();
    let cancel = CancellationToken::new();
    let backend = ScriptedBackend::default()
        .interrupt_after(1, &cancel)
        .unreachable();

    let report = run_fleet(&backend, &store(dir.path()), &config(1, dir.path()), &cancel)
        .await
        .unwrap();

    assert_eq!(report.cancelled, 1);
    assert_eq!(report.outcome(), FleetOutcome::Clean);
}

#[tokio::test]
async fn test_matched_failure_cancels_the_rest_of_the_fleet() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::default().named(&["alpha", "beta"]).script(
        "alpha",
        vec![Run::pass(), Run::fail("ok"), Run::fail("FATAL: oops")],
    );
    let cfg = config(2, dir.path()).with_pattern(Some("FATAL")).unwrap();
    let cancel = CancellationToken::new();

    let report = run_fleet(&backend, &store(dir.path()), &cfg, &cancel)
        .await
        .unwrap();

    assert!(cancel.is_cancelled());
    assert_eq!(report.outcome(), FleetOutcome::FailureFound);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].worker.id, "alpha");
    assert_eq!(report.failures[0].run, 3);
    assert_eq!(report.cancelled, 1);
    assert_eq!(artifacts(dir.path()), vec!["alpha.out", "alpha.tar.gz"]);
    assert_eq!(
        std::fs::read(dir.path().join("alpha.out")).unwrap(),
        b"FATAL: oops"
    );
}

#[tokio::test]
async fn test_every_session_reaches_a_terminal_state() {
    for instances in 1..=5 {
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();
        let backend = ScriptedBackend::default().interrupt_after(instances as usize * 2, &cancel);

        let report = run_fleet(&backend, &store(dir.path()), &config(instances, dir.path()), &cancel)
            .await
            .unwrap();

        assert_eq!(report.launched, instances);
        assert_eq!(report.cancelled, instances);
        assert_eq!(backend.created().len(), instances as usize);
    }
}

#[tokio::test]
async fn test_keep_going_collects_every_failure() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::default().default_run(Run::fail("boom"));
    let mut cfg = config(3, dir.path());
    cfg.keep_going = true;
    let cancel = CancellationToken::new();

    let report = run_fleet(&backend, &store(dir.path()), &cfg, &cancel)
        .await
        .unwrap();

    assert!(!cancel.is_cancelled());
    assert_eq!(report.failures.len(), 3);
    assert_eq!(report.cancelled, 0);
    assert_eq!(artifacts(dir.path()).len(), 6);
}

#[tokio::test]
async fn test_setup_failures_leave_a_clean_report() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::default().failing_creates(u32::MAX);
    let mut cfg = config(2, dir.path());
    cfg.deflake = 2;

    let report = run_fleet(&backend, &store(dir.path()), &cfg, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.setup_failed, 2);
    assert_eq!(report.outcome(), FleetOutcome::Clean);
    assert_eq!(backend.create_attempts(), 4);
}

#[tokio::test]
async fn test_lost_worker_fails_the_fleet() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::default()
        .named(&["alpha", "beta"])
        .script("alpha", vec![Run::fail("alpha: connection reset")]);
    let cancel = CancellationToken::new();

    let err = run_fleet(&backend, &store(dir.path()), &config(2, dir.path()), &cancel)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "lost builder \"alpha\"");
    assert!(cancel.is_cancelled());
}

#[tokio::test]
async fn test_unknown_instance_type_fails_before_launch() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::default();
    let cfg = SwarmConfig::new("plan9-386", vec!["true".into()]);

    let err = run_fleet(&backend, &store(dir.path()), &cfg, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "invalid instance type: plan9-386");
    assert_eq!(backend.create_attempts(), 0);
}

#[tokio::test]
async fn test_missing_command_fails_before_launch() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::default();
    let cfg = SwarmConfig::new(TYPE, Vec::new());

    let err = run_fleet(&backend, &store(dir.path()), &cfg, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "expected a command");
    assert_eq!(backend.create_attempts(), 0);
}

#[tokio::test]
async fn test_clean_up_destroys_only_matching_type() {
    let backend = ScriptedBackend::default().with_existing(vec![
        WorkerHandle::new("x", TYPE),
        WorkerHandle::new("y", "windows-amd64"),
        WorkerHandle::new("z", TYPE),
    ]);

    let destroyed = clean_up_instances(&backend, TYPE).await.unwrap();

    assert_eq!(destroyed, 2);
    assert_eq!(backend.destroyed(), vec!["x", "z"]);
}

#[tokio::test]
async fn test_prepare_cleans_up_only_in_start_mode() {
    let existing = vec![WorkerHandle::new("old", TYPE)];
    let dir = tempfile::tempdir().unwrap();

    let backend = ScriptedBackend::default().with_existing(existing.clone());
    prepare(&backend, &config(1, dir.path())).await.unwrap();
    assert!(backend.destroyed().is_empty());

    let backend = ScriptedBackend::default().with_existing(existing);
    let mut cfg = config(1, dir.path());
    cfg.cleanup = CleanupMode::Start;
    prepare(&backend, &cfg).await.unwrap();
    assert_eq!(backend.destroyed(), vec!["old"]);
}
