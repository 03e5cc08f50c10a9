//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::PathBuf;
use std::process::{ExitStatus, Output};

use anyhow::Result;
use tokio::io::AsyncWrite;

use crate::domain::{RunOutcome, WorkerHandle};

// ── Worker Port Traits ────────────────────────────────────────────────────────

/// Read-only queries against the worker backend.
#[allow(async_fn_in_trait)]
pub trait WorkerInventory {
    /// Instance types the backend can create.
    async fn instance_types(&self) -> Result<Vec<String>>;
    /// Every worker currently alive, of any type.
    async fn list(&self) -> Result<Vec<WorkerHandle>>;
}

/// Worker lifecycle: create and destroy.
#[allow(async_fn_in_trait)]
pub trait WorkerLifecycle {
    /// Create a new worker of the given type.
    async fn create(&self, instance_type: &str) -> Result<WorkerHandle>;
    /// Destroy a worker.
    async fn destroy(&self, worker: &WorkerHandle) -> Result<()>;
}

/// Moving data to and from a worker.
#[allow(async_fn_in_trait)]
pub trait WorkerTransfer {
    /// Sync the unit of work onto the worker. What gets pushed is decided by
    /// ambient configuration (the root-path environment variable).
    async fn provision(&self, worker: &WorkerHandle) -> Result<()>;
    /// Stream the worker's working directory as a `.tar.gz` into `sink`.
    async fn fetch_archive<W>(&self, worker: &WorkerHandle, sink: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin;
}

/// Command execution on a worker.
#[allow(async_fn_in_trait)]
pub trait WorkerExecutor {
    /// Run `command` with `env` (in order) on the worker.
    ///
    /// A non-zero exit is a normal `RunOutcome`, not an error. Only failing
    /// to reach the backend at all is an `Err`.
    async fn execute(
        &self,
        worker: &WorkerHandle,
        env: &[String],
        command: &[String],
    ) -> Result<RunOutcome>;
}

/// Composite trait: any type implementing all four sub-traits is a `WorkerBackend`.
pub trait WorkerBackend: WorkerInventory + WorkerLifecycle + WorkerTransfer + WorkerExecutor {}

/// Blanket implementation: any type implementing all four sub-traits is a `WorkerBackend`.
impl<T> WorkerBackend for T where T: WorkerInventory + WorkerLifecycle + WorkerTransfer + WorkerExecutor
{}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program to completion and capture stdout and stderr.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or waited on. A
    /// non-zero exit is reported through `Output::status`.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;

    /// Run a program, copying its stdout into `sink` as it arrives.
    ///
    /// Returns the exit status and the captured stderr.
    async fn run_to_sink<W>(
        &self,
        program: &str,
        args: &[&str],
        sink: &mut W,
    ) -> Result<(ExitStatus, Vec<u8>)>
    where
        W: AsyncWrite + Unpin;
}

// ── Artifact Port ─────────────────────────────────────────────────────────────

/// Where failure artifacts are persisted. Every name is namespaced by the
/// worker id so concurrent sessions never collide.
#[allow(async_fn_in_trait)]
pub trait ArtifactStore {
    /// Sink the worker archive is streamed into.
    type Archive: AsyncWrite + Unpin;

    /// Write the combined output of a matched failure to `<id>.out`.
    async fn write_output(&self, worker: &WorkerHandle, output: &[u8]) -> Result<PathBuf>;
    /// Write the output of an unmatched failure to a fresh temp file.
    async fn write_unmatched(&self, worker: &WorkerHandle, output: &[u8]) -> Result<PathBuf>;
    /// Create `<id>.tar.gz` and return it for streaming.
    async fn create_archive(&self, worker: &WorkerHandle) -> Result<(PathBuf, Self::Archive)>;
}
