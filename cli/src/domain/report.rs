//! Session terminal states and the aggregated fleet report.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::worker::WorkerHandle;

/// A matched failure and where its artifacts ended up.
#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    pub worker: WorkerHandle,
    pub found_at: DateTime<Utc>,
    /// 1-based run number within the session.
    pub run: u64,
    /// Combined output artifact, if it could be written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    /// Working-directory archive, if it could be downloaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_path: Option<PathBuf>,
}

/// Why a session stopped without a qualifying failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The fleet asked it to stop.
    Cancelled,
    /// Create or provision exhausted the deflake budget.
    SetupFailed,
}

/// How a session ended, short of an error.
#[derive(Debug, Clone)]
pub enum SessionEnd {
    NoFailure(StopReason),
    /// Matched failure; the session asked the fleet to stop.
    MatchedFailure(FailureReport),
    /// Matched failure under keep-going; only this session stopped.
    KeptGoing(FailureReport),
}

impl SessionEnd {
    #[must_use]
    pub fn failure(&self) -> Option<&FailureReport> {
        match self {
            Self::NoFailure(_) => None,
            Self::MatchedFailure(r) | Self::KeptGoing(r) => Some(r),
        }
    }

    /// Whether this end should cancel the remaining sessions.
    #[must_use]
    pub fn stops_fleet(&self) -> bool {
        matches!(self, Self::MatchedFailure(_))
    }
}

/// Overall result of a fleet run that did not hit a hard error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FleetOutcome {
    /// Every session stopped without a qualifying failure.
    Clean,
    /// At least one matched failure was captured.
    FailureFound,
}

/// Aggregate of every session's terminal state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FleetReport {
    pub launched: u32,
    pub cancelled: u32,
    pub setup_failed: u32,
    pub failures: Vec<FailureReport>,
}

impl FleetReport {
    /// Fold one session's end into the report.
    pub fn record(&mut self, end: SessionEnd) {
        match end {
            SessionEnd::NoFailure(StopReason::Cancelled) => self.cancelled += 1,
            SessionEnd::NoFailure(StopReason::SetupFailed) => self.setup_failed += 1,
            SessionEnd::MatchedFailure(r) | SessionEnd::KeptGoing(r) => self.failures.push(r),
        }
    }

    #[must_use]
    pub fn outcome(&self) -> FleetOutcome {
        if self.failures.is_empty() {
            FleetOutcome::Clean
        } else {
            FleetOutcome::FailureFound
        }
    }
}
