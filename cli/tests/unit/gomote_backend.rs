//! `GomoteBackend` argument construction and output handling, through a
//! recording runner.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use swarm_cli::application::ports::{
    WorkerExecutor, WorkerInventory, WorkerLifecycle, WorkerTransfer,
};
use swarm_cli::domain::{BackendError, RunStatus, WorkerHandle};
use swarm_cli::infra::gomote::GomoteBackend;

use crate::helpers::{TYPE, err_output, exit_status, ok_output};
use crate::mocks::RecordingRunner;

fn backend(responses: Vec<std::process::Output>) -> GomoteBackend<RecordingRunner> {
    GomoteBackend::new(RecordingRunner::new(responses), "gomote")
}

fn worker() -> WorkerHandle {
    WorkerHandle::new("user-alice-linux-amd64-0", TYPE)
}

fn args(backend: &GomoteBackend<RecordingRunner>) -> Vec<Vec<String>> {
    backend
        .runner()
        .calls()
        .into_iter()
        .map(|(program, args)| {
            assert_eq!(program, "gomote");
            args
        })
        .collect()
}

#[tokio::test]
async fn test_execute_passes_env_pairs_before_the_worker_id() {
    let b = backend(vec![ok_output(b"ok\n")]);
    let env = vec!["GOFLAGS=-count=1".to_string(), "A=1".to_string(), "A=2".to_string()];
    let command = vec!["go".to_string(), "test".to_string(), "-run".to_string(), "TestX".to_string()];

    let outcome = b.execute(&worker(), &env, &command).await.unwrap();

    assert_eq!(outcome.status, RunStatus::Succeeded);
    assert_eq!(
        args(&b),
        vec![vec![
            "run",
            "-e",
            "GOFLAGS=-count=1",
            "-e",
            "A=1",
            "-e",
            "A=2",
            "user-alice-linux-amd64-0",
            "go",
            "test",
            "-run",
            "TestX",
        ]]
    );
}

#[tokio::test]
async fn test_execute_reports_exit_code_as_outcome_not_error() {
    let b = backend(vec![err_output(2, b"--- FAIL: TestX\n")]);

    let outcome = b
        .execute(&worker(), &[], &["go".to_string()])
        .await
        .unwrap();

    assert_eq!(outcome.status, RunStatus::Exited(2));
    assert_eq!(outcome.stderr, b"--- FAIL: TestX\n");
}

#[tokio::test]
async fn test_instance_types_parse_usage_despite_failure_exit() {
    let usage = b"usage: gomote create [create-opts] <type>\n\nValid types:\n  * linux-amd64\n  * windows-amd64 [Deprecated]\n";
    let b = backend(vec![std::process::Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: usage.to_vec(),
    }]);

    let types = b.instance_types().await.unwrap();

    assert_eq!(types, vec!["linux-amd64", "windows-amd64"]);
    assert_eq!(args(&b), vec![vec!["create"]]);
}

#[tokio::test]
async fn test_create_returns_trimmed_id() {
    let b = backend(vec![ok_output(b"user-alice-linux-amd64-3\n")]);

    let w = b.create(TYPE).await.unwrap();

    assert_eq!(w, WorkerHandle::new("user-alice-linux-amd64-3", TYPE));
    assert_eq!(args(&b), vec![vec!["create", TYPE]]);
}

#[tokio::test]
async fn test_create_with_empty_output_is_malformed() {
    let b = backend(vec![ok_output(b"\n")]);

    let err = b.create(TYPE).await.unwrap_err();

    assert!(
        matches!(err.downcast_ref::<BackendError>(), Some(BackendError::Malformed { .. })),
        "{err}"
    );
}

#[tokio::test]
async fn test_failed_destroy_reports_stderr() {
    let b = backend(vec![err_output(1, b"no such instance\n")]);

    let err = b.destroy(&worker()).await.unwrap_err();

    assert!(err.to_string().contains("gomote destroy"), "{err}");
    assert!(err.to_string().contains("<stderr>: no such instance"), "{err}");
}

#[tokio::test]
async fn test_failed_push_without_output() {
    let b = backend(vec![err_output(1, b"")]);

    let err = b.provision(&worker()).await.unwrap_err();

    assert!(err.to_string().contains("<no output>"), "{err}");
    assert_eq!(args(&b), vec![vec!["push", "user-alice-linux-amd64-0"]]);
}

#[tokio::test]
async fn test_list_parses_tab_separated_lines() {
    let b = backend(vec![ok_output(
        b"user-alice-linux-amd64-0\tlinux-amd64\thost-linux\texpires in 29m\n\
          user-alice-windows-amd64-0\twindows-amd64\thost-windows\texpires in 10m\n",
    )]);

    let workers = b.list().await.unwrap();

    assert_eq!(
        workers,
        vec![
            WorkerHandle::new("user-alice-linux-amd64-0", "linux-amd64"),
            WorkerHandle::new("user-alice-windows-amd64-0", "windows-amd64"),
        ]
    );
}

#[tokio::test]
async fn test_fetch_archive_streams_stdout_into_sink() {
    let b = backend(vec![ok_output(b"\x1f\x8bTARBALL")]);
    let mut sink: Vec<u8> = Vec::new();

    b.fetch_archive(&worker(), &mut sink).await.unwrap();

    assert_eq!(sink, b"\x1f\x8bTARBALL");
    assert_eq!(args(&b), vec![vec!["gettar", "user-alice-linux-amd64-0"]]);
}

#[tokio::test]
async fn test_fetch_archive_failure_is_an_error() {
    let b = backend(vec![err_output(1, b"instance gone")]);
    let mut sink: Vec<u8> = Vec::new();

    let err = b.fetch_archive(&worker(), &mut sink).await.unwrap_err();

    assert!(err.to_string().contains("gomote gettar"), "{err}");
}
