//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod classify;
pub mod config;
pub mod error;
pub mod report;
pub mod worker;

pub use classify::{InfrastructureFailure, Verdict, classify};
pub use config::{CleanupMode, SwarmConfig};
pub use error::{BackendError, SwarmError};
pub use report::{FailureReport, FleetOutcome, FleetReport, SessionEnd, StopReason};
pub use worker::{RunOutcome, RunStatus, WorkerHandle};
