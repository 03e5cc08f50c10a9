//! Infrastructure implementation of the `CommandRunner` port.
//!
//! `TokioCommandRunner` is the production implementation that uses tokio
//! for async process execution. No timeout is imposed: a remote run lasts as
//! long as the user's command does.

use std::process::{ExitStatus, Output, Stdio};

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

use crate::application::ports::CommandRunner;

/// Production `CommandRunner`. Children inherit this process's environment,
/// which is how the root-path variable reaches the backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioCommandRunner;

impl TokioCommandRunner {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

async fn read_all<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = h.read_to_end(&mut buf).await;
    }
    buf
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        let mut child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        let stdout_handle = child.stdout.take();
        let stderr_handle = child.stderr.take();

        // Read stdout/stderr concurrently with wait() so a chatty child
        // never blocks on a full pipe.
        let (status, stdout, stderr) = tokio::join!(
            child.wait(),
            read_all(stdout_handle),
            read_all(stderr_handle),
        );
        Ok(Output {
            status: status.with_context(|| format!("waiting for {program}"))?,
            stdout,
            stderr,
        })
    }

    async fn run_to_sink<W>(
        &self,
        program: &str,
        args: &[&str],
        sink: &mut W,
    ) -> Result<(ExitStatus, Vec<u8>)>
    where
        W: AsyncWrite + Unpin,
    {
        let mut child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        let stdout = child
            .stdout
            .take()
            .with_context(|| format!("{program} stdout not captured"))?;
        let stderr = child.stderr.take();

        let (copied, stderr, status) = tokio::join!(
            async {
                let mut stdout = stdout;
                tokio::io::copy(&mut stdout, sink).await
            },
            read_all(stderr),
            child.wait(),
        );
        let status = status.with_context(|| format!("waiting for {program}"))?;
        copied.with_context(|| format!("copying output of {program}"))?;
        Ok((status, stderr))
    }
}
