//! Application service: one worker's lifecycle.
//!
//! A session creates a worker, provisions it, then runs the command in a loop
//! until it sees a matched failure, a fatal error, or fleet cancellation.
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{ArtifactStore, WorkerBackend};
use crate::application::services::retry::with_retry;
use crate::domain::{
    CleanupMode, FailureReport, InfrastructureFailure, SessionEnd, StopReason, SwarmConfig,
    SwarmError, Verdict, WorkerHandle, classify,
};

/// Non-terminal states a session moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Creating,
    Provisioning,
    Running,
}

/// Everything a session borrows from the fleet.
pub struct SessionContext<'a, B, A> {
    pub backend: &'a B,
    pub artifacts: &'a A,
    pub config: &'a SwarmConfig,
    pub cancel: &'a CancellationToken,
}

impl<B, A> Clone for SessionContext<'_, B, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B, A> Copy for SessionContext<'_, B, A> {}

/// Drive one worker from creation to a terminal state.
///
/// Setup failures that exhaust the deflake budget end the session with
/// `NoFailure(SetupFailed)` rather than an error: the fleet simply runs one
/// worker short. With `CleanupMode::Exit` the worker is destroyed whatever
/// the outcome.
///
/// # Errors
///
/// Returns an error when the worker is lost, the backend cannot run the
/// command at all, or the run carries no exit code.
pub async fn run_session<B, A>(ctx: SessionContext<'_, B, A>) -> Result<SessionEnd>
where
    B: WorkerBackend,
    A: ArtifactStore,
{
    let config = ctx.config;
    if ctx.cancel.is_cancelled() {
        return Ok(SessionEnd::NoFailure(StopReason::Cancelled));
    }

    tracing::debug!(state = ?SessionState::Creating, instance_type = %config.instance_type);
    let created = with_retry("creating instance", config.deflake, |_| {
        ctx.backend.create(&config.instance_type)
    })
    .await;
    let worker = match created {
        Ok(worker) => worker,
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "creating instance failed, continuing without it");
            return Ok(SessionEnd::NoFailure(StopReason::SetupFailed));
        }
    };
    tracing::info!(worker = %worker, "created instance");

    let result = drive(ctx, &worker).await;

    if config.cleanup == CleanupMode::Exit {
        teardown(ctx.backend, &worker).await;
    }
    result
}

async fn drive<B, A>(ctx: SessionContext<'_, B, A>, worker: &WorkerHandle) -> Result<SessionEnd>
where
    B: WorkerBackend,
    A: ArtifactStore,
{
    if ctx.cancel.is_cancelled() {
        return Ok(SessionEnd::NoFailure(StopReason::Cancelled));
    }

    tracing::debug!(state = ?SessionState::Provisioning, worker = %worker);
    let pushed = with_retry("pushing to instance", ctx.config.deflake, |_| {
        ctx.backend.provision(worker)
    })
    .await;
    if let Err(e) = pushed {
        tracing::warn!(worker = %worker, error = %format!("{e:#}"), "pushing to instance failed, continuing without it");
        return Ok(SessionEnd::NoFailure(StopReason::SetupFailed));
    }
    tracing::info!(worker = %worker, "pushed to instance");

    if ctx.cancel.is_cancelled() {
        return Ok(SessionEnd::NoFailure(StopReason::Cancelled));
    }

    tracing::debug!(state = ?SessionState::Running, worker = %worker);
    run_loop(ctx, worker).await
}

async fn run_loop<B, A>(ctx: SessionContext<'_, B, A>, worker: &WorkerHandle) -> Result<SessionEnd>
where
    B: WorkerBackend,
    A: ArtifactStore,
{
    let config = ctx.config;
    let mut run: u64 = 0;
    loop {
        // Sessions share one task; yield so siblings make progress.
        tokio::task::yield_now().await;
        if ctx.cancel.is_cancelled() {
            return Ok(SessionEnd::NoFailure(StopReason::Cancelled));
        }

        run += 1;
        tracing::debug!(worker = %worker, run, "running command");
        let executed = ctx
            .backend
            .execute(worker, &config.env, &config.command)
            .await;

        // Once cancelled, a run that failed to report is not an error.
        if ctx.cancel.is_cancelled() {
            return Ok(SessionEnd::NoFailure(StopReason::Cancelled));
        }
        let outcome = executed.with_context(|| format!("running command on {worker}"))?;

        let verdict = classify(&outcome, config.pattern.as_ref()).map_err(
            |InfrastructureFailure(reason)| SwarmError::Infrastructure {
                worker: worker.id.clone(),
                reason,
            },
        )?;

        match verdict {
            Verdict::NotAFailure => {}
            Verdict::UnmatchedFailure => {
                record_unmatched(ctx, worker, &outcome.combined()).await;
            }
            Verdict::MatchedFailure => {
                let report = capture_failure(ctx, worker, run, &outcome.combined()).await;
                return Ok(if config.keep_going {
                    SessionEnd::KeptGoing(report)
                } else {
                    SessionEnd::MatchedFailure(report)
                });
            }
            Verdict::LostWorker => {
                return Err(SwarmError::LostWorker {
                    worker: worker.id.clone(),
                }
                .into());
            }
        }
    }
}

/// Best-effort: keep the output of a failure that did not match around.
async fn record_unmatched<B, A>(ctx: SessionContext<'_, B, A>, worker: &WorkerHandle, output: &[u8])
where
    A: ArtifactStore,
{
    if ctx.config.verbosity < 2 {
        tracing::info!(worker = %worker, "unmatched failure");
    } else {
        tracing::info!(
            worker = %worker,
            "unmatched failure:\n{}",
            String::from_utf8_lossy(output)
        );
    }
    match ctx.artifacts.write_unmatched(worker, output).await {
        Ok(path) => tracing::info!(worker = %worker, path = %path.display(), "wrote output"),
        Err(e) => {
            tracing::warn!(worker = %worker, error = %format!("{e:#}"), "failed to write output to temp file");
        }
    }
}

/// Persist the output and the worker's working directory.
///
/// Neither step can fail the session: a missing artifact is logged and left
/// out of the report.
async fn capture_failure<B, A>(
    ctx: SessionContext<'_, B, A>,
    worker: &WorkerHandle,
    run: u64,
    output: &[u8],
) -> FailureReport
where
    B: WorkerBackend,
    A: ArtifactStore,
{
    tracing::info!(worker = %worker, run, "discovered failure");

    let output_path = match ctx.artifacts.write_output(worker, output).await {
        Ok(path) => {
            tracing::info!(worker = %worker, path = %path.display(), "wrote output");
            Some(path)
        }
        Err(e) => {
            tracing::warn!(worker = %worker, error = %format!("{e:#}"), "failed to write output");
            tracing::warn!(
                worker = %worker,
                "dumping output:\n{}",
                String::from_utf8_lossy(output)
            );
            None
        }
    };

    let archive_path = match ctx.artifacts.create_archive(worker).await {
        Ok((path, mut sink)) => {
            let fetched = async {
                ctx.backend.fetch_archive(worker, &mut sink).await?;
                sink.flush().await.context("flushing archive")?;
                anyhow::Ok(())
            }
            .await;
            match fetched {
                Ok(()) => {
                    tracing::info!(worker = %worker, path = %path.display(), "downloaded archive");
                    Some(path)
                }
                Err(e) => {
                    tracing::warn!(worker = %worker, error = %format!("{e:#}"), "failed to download archive");
                    None
                }
            }
        }
        Err(e) => {
            tracing::warn!(worker = %worker, error = %format!("{e:#}"), "failed to create archive");
            None
        }
    };

    FailureReport {
        worker: worker.clone(),
        found_at: Utc::now(),
        run,
        output_path,
        archive_path,
    }
}

async fn teardown(backend: &impl WorkerBackend, worker: &WorkerHandle) {
    match backend.destroy(worker).await {
        Ok(()) => tracing::info!(worker = %worker, "destroyed instance"),
        Err(e) => {
            tracing::warn!(worker = %worker, error = %format!("{e:#}"), "failed to destroy instance");
        }
    }
}
