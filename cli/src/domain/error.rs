//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Backend errors ────────────────────────────────────────────────────────────

/// Infrastructure failures reported by the worker backend.
///
/// These are transient by nature: setup operations retry them, everything
/// else surfaces them to the fleet.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("could not invoke backend for `{op}`: {reason}")]
    Spawn { op: String, reason: String },

    #[error("`{op}` failed ({status}): {detail}")]
    Failed {
        op: String,
        status: String,
        detail: String,
    },

    #[error("unexpected `{op}` format: {line:?}")]
    Malformed { op: String, line: String },
}

// ── Swarm errors ──────────────────────────────────────────────────────────────

/// Validation errors and session-fatal conditions.
#[derive(Debug, Error)]
pub enum SwarmError {
    #[error("expected a command")]
    MissingCommand,

    #[error("invalid instance type: {0}")]
    InvalidInstanceType(String),

    #[error("compiling regexp: {0}")]
    InvalidPattern(String),

    #[error("invalid environment variable {0:?}: expected KEY=VALUE")]
    InvalidEnv(String),

    #[error("instance count must be at least 1")]
    NoInstances,

    #[error("lost builder {worker:?}")]
    LostWorker { worker: String },

    #[error("running command on {worker}: {reason}")]
    Infrastructure { worker: String, reason: String },
}
