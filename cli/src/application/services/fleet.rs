//! Application service: fan out sessions and aggregate their outcomes.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use anyhow::{Context, Result};
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::application::ports::{ArtifactStore, WorkerBackend, WorkerInventory, WorkerLifecycle};
use crate::application::services::session::{SessionContext, run_session};
use crate::domain::{CleanupMode, FleetReport, SwarmConfig, SwarmError};

/// Check that the backend knows the requested instance type.
///
/// # Errors
///
/// Returns `SwarmError::InvalidInstanceType` for an unknown type, or the
/// backend error if the type list cannot be fetched.
pub async fn validate_instance_type(backend: &impl WorkerInventory, instance_type: &str) -> Result<()> {
    let types = backend
        .instance_types()
        .await
        .context("listing instance types")?;
    if types.iter().any(|t| t == instance_type) {
        return Ok(());
    }
    Err(SwarmError::InvalidInstanceType(instance_type.to_string()).into())
}

/// Destroy every existing worker of `instance_type`, leaving other types
/// alone. Returns how many were destroyed.
///
/// # Errors
///
/// Returns an error if listing fails or any destroy fails.
pub async fn clean_up_instances<B>(backend: &B, instance_type: &str) -> Result<usize>
where
    B: WorkerInventory + WorkerLifecycle,
{
    let workers = backend.list().await?;
    let mut destroyed = 0;
    for worker in workers.iter().filter(|w| w.kind == instance_type) {
        tracing::info!(worker = %worker, "destroying instance");
        backend.destroy(worker).await?;
        destroyed += 1;
    }
    Ok(destroyed)
}

/// Validation and start-of-run cleanup. Runs before any session launches.
///
/// # Errors
///
/// Returns an error if the instance type is invalid or cleanup fails.
pub async fn prepare(backend: &impl WorkerBackend, config: &SwarmConfig) -> Result<()> {
    validate_instance_type(backend, &config.instance_type).await?;
    if config.cleanup == CleanupMode::Start {
        let destroyed = clean_up_instances(backend, &config.instance_type)
            .await
            .context("cleaning up instances")?;
        tracing::info!(destroyed, instance_type = %config.instance_type, "cleaned up instances");
    }
    Ok(())
}

/// Run `config.instances` sessions concurrently until they all stop.
///
/// The first session to capture a matched failure (without keep-going) or
/// to fail outright cancels `cancel`; the others notice at their next loop
/// boundary. `cancel` is also how the caller maps an interrupt onto the
/// fleet. Workers are left alive unless the cleanup mode is `Exit`.
///
/// # Errors
///
/// Returns a validation error before launching anything, or the first
/// session error observed. Later session errors are logged and dropped.
pub async fn run_fleet<B, A>(
    backend: &B,
    artifacts: &A,
    config: &SwarmConfig,
    cancel: &CancellationToken,
) -> Result<FleetReport>
where
    B: WorkerBackend,
    A: ArtifactStore,
{
    config.ensure_command()?;
    prepare(backend, config).await?;

    let ctx = SessionContext {
        backend,
        artifacts,
        config,
        cancel,
    };
    let mut sessions: FuturesUnordered<_> = (0..config.instances)
        .map(|index| run_session(ctx).instrument(tracing::info_span!("session", index)))
        .collect();

    let mut report = FleetReport {
        launched: config.instances,
        ..FleetReport::default()
    };
    let mut first_error: Option<anyhow::Error> = None;

    while let Some(result) = sessions.next().await {
        match result {
            Ok(end) => {
                if end.stops_fleet() {
                    cancel.cancel();
                }
                report.record(end);
            }
            Err(e) => {
                cancel.cancel();
                if first_error.is_none() {
                    tracing::error!(error = %format!("{e:#}"), "session failed, stopping fleet");
                    first_error = Some(e);
                } else {
                    tracing::warn!(error = %format!("{e:#}"), "discarding additional session error");
                }
            }
        }
    }

    if let Some(e) = first_error {
        return Err(e);
    }
    tracing::info!(
        launched = report.launched,
        cancelled = report.cancelled,
        setup_failed = report.setup_failed,
        failures = report.failures.len(),
        "fleet stopped"
    );
    Ok(report)
}
