//! Infrastructure implementation of the worker port traits on top of the
//! `gomote` command-line tool.
//!
//! `GomoteBackend<R>` routes every call through a `CommandRunner`, so tests
//! can inject a recording runner without spawning real processes.

pub mod parse;

use std::process::{ExitStatus, Output};

use anyhow::Result;
use tokio::io::AsyncWrite;

use crate::application::ports::{
    CommandRunner, WorkerExecutor, WorkerInventory, WorkerLifecycle, WorkerTransfer,
};
use crate::domain::{BackendError, RunOutcome, RunStatus, WorkerHandle};
use crate::infra::command_runner::TokioCommandRunner;

/// Program invoked when no override is configured.
pub const DEFAULT_GOMOTE: &str = "gomote";

/// Infrastructure adapter that routes all gomote calls through a `CommandRunner`.
pub struct GomoteBackend<R: CommandRunner> {
    runner: R,
    program: String,
}

impl<R: CommandRunner> GomoteBackend<R> {
    /// Create a backend with an explicit runner and program name.
    pub fn new(runner: R, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    /// The runner every call goes through.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    async fn invoke(&self, op: &str, args: &[&str]) -> Result<Output, BackendError> {
        self.runner
            .run(&self.program, args)
            .await
            .map_err(|e| BackendError::Spawn {
                op: op.to_string(),
                reason: format!("{e:#}"),
            })
    }

    /// Invoke and require a zero exit.
    async fn invoke_checked(&self, op: &str, args: &[&str]) -> Result<Output, BackendError> {
        let output = self.invoke(op, args).await?;
        ensure_success(op, output.status, &output.stderr)?;
        Ok(output)
    }
}

impl GomoteBackend<TokioCommandRunner> {
    /// Convenience constructor for production use.
    #[must_use]
    pub fn default_runner(program: impl Into<String>) -> Self {
        Self::new(TokioCommandRunner::new(), program)
    }
}

fn ensure_success(op: &str, status: ExitStatus, stderr: &[u8]) -> Result<(), BackendError> {
    if status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(stderr);
    let detail = match stderr.trim() {
        "" => "<no output>".to_string(),
        s => format!("<stderr>: {s}"),
    };
    Err(BackendError::Failed {
        op: op.to_string(),
        status: status.to_string(),
        detail,
    })
}

impl<R: CommandRunner> WorkerInventory for GomoteBackend<R> {
    async fn instance_types(&self) -> Result<Vec<String>> {
        // A bare `gomote create` prints usage and the valid types, then
        // exits non-zero. Only a failure to run it at all matters.
        let output = self.invoke("gomote create", &["create"]).await?;
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(parse::parse_instance_types(&text)?)
    }

    async fn list(&self) -> Result<Vec<WorkerHandle>> {
        let output = self.invoke_checked("gomote list", &["list"]).await?;
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(parse::parse_instance_list(&text)?)
    }
}

impl<R: CommandRunner> WorkerLifecycle for GomoteBackend<R> {
    async fn create(&self, instance_type: &str) -> Result<WorkerHandle> {
        let output = self
            .invoke_checked("gomote create", &["create", instance_type])
            .await?;
        let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if id.is_empty() {
            return Err(BackendError::Malformed {
                op: "gomote create".to_string(),
                line: String::new(),
            }
            .into());
        }
        Ok(WorkerHandle::new(id, instance_type))
    }

    async fn destroy(&self, worker: &WorkerHandle) -> Result<()> {
        self.invoke_checked("gomote destroy", &["destroy", &worker.id])
            .await?;
        Ok(())
    }
}

impl<R: CommandRunner> WorkerTransfer for GomoteBackend<R> {
    async fn provision(&self, worker: &WorkerHandle) -> Result<()> {
        self.invoke_checked("gomote push", &["push", &worker.id])
            .await?;
        Ok(())
    }

    async fn fetch_archive<W>(&self, worker: &WorkerHandle, sink: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let op = "gomote gettar";
        let (status, stderr) = self
            .runner
            .run_to_sink(&self.program, &["gettar", &worker.id], sink)
            .await
            .map_err(|e| BackendError::Spawn {
                op: op.to_string(),
                reason: format!("{e:#}"),
            })?;
        ensure_success(op, status, &stderr)?;
        Ok(())
    }
}

impl<R: CommandRunner> WorkerExecutor for GomoteBackend<R> {
    async fn execute(
        &self,
        worker: &WorkerHandle,
        env: &[String],
        command: &[String],
    ) -> Result<RunOutcome> {
        let mut args: Vec<&str> = Vec::with_capacity(2 + env.len() * 2 + command.len());
        args.push("run");
        for var in env {
            args.push("-e");
            args.push(var);
        }
        args.push(&worker.id);
        args.extend(command.iter().map(String::as_str));

        let output = self.invoke("gomote run", &args).await?;
        let status = match output.status.code() {
            Some(0) => RunStatus::Succeeded,
            Some(code) => RunStatus::Exited(code),
            None => RunStatus::Infrastructure(format!("gomote run {}", output.status)),
        };
        Ok(RunOutcome {
            worker: worker.clone(),
            status,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
