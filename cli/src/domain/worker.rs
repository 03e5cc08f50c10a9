//! Worker domain types: handles and the outcome of a single remote run.
//!
//! This module is intentionally free of I/O, async, and external layer imports.

use serde::Serialize;

/// A remote worker created by the backend.
///
/// Owned by the session that created it; the id is never reused within a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WorkerHandle {
    /// Backend-assigned identifier, e.g. `"user-alice-linux-amd64-0"`.
    pub id: String,
    /// Instance type the worker was requested as.
    #[serde(rename = "type")]
    pub kind: String,
}

impl WorkerHandle {
    #[must_use]
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
        }
    }
}

impl std::fmt::Display for WorkerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id)
    }
}

/// How a single command execution ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// The command exited 0.
    Succeeded,
    /// The command exited with a non-zero code. Expected, not exceptional.
    Exited(i32),
    /// The backend could not deliver an exit code (e.g. killed by a signal).
    Infrastructure(String),
}

/// Result of one command execution on one worker.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub worker: WorkerHandle,
    pub status: RunStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl RunOutcome {
    /// Stdout followed by stderr: what the classifier inspects and what the
    /// output artifacts contain.
    #[must_use]
    pub fn combined(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.stdout.len() + self.stderr.len());
        out.extend_from_slice(&self.stdout);
        out.extend_from_slice(&self.stderr);
        out
    }
}
