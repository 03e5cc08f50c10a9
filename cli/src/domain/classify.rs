//! Failure classification for a single remote run.
//!
//! Pure function of its inputs: classifying the same outcome with the same
//! pattern always yields the same verdict.

use regex::bytes::Regex;

use crate::domain::worker::{RunOutcome, RunStatus};

/// What a run means for the session that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The command succeeded; run it again.
    NotAFailure,
    /// The command failed but its output does not match the pattern.
    UnmatchedFailure,
    /// The failure we are hunting for.
    MatchedFailure,
    /// The worker appears to have dropped out from under the command.
    LostWorker,
}

/// The backend could not produce an exit code for the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfrastructureFailure(pub String);

/// Classify a run outcome.
///
/// Rules, in order: success, infrastructure failure, lost worker, pattern
/// mismatch, matched failure. Without a pattern every command failure that
/// is not a lost worker is a matched failure.
///
/// # Errors
///
/// Returns `InfrastructureFailure` when the run carries no exit code.
pub fn classify(
    outcome: &RunOutcome,
    pattern: Option<&Regex>,
) -> Result<Verdict, InfrastructureFailure> {
    match &outcome.status {
        RunStatus::Succeeded => return Ok(Verdict::NotAFailure),
        RunStatus::Infrastructure(reason) => return Err(InfrastructureFailure(reason.clone())),
        RunStatus::Exited(_) => {}
    }

    let output = outcome.combined();

    // Heuristic: a worker that rebooted mid-run tends to echo its own
    // hostname, which is the worker id. Not a guaranteed detector.
    if contains_bytes(&output, &outcome.worker.id) {
        return Ok(Verdict::LostWorker);
    }

    if let Some(re) = pattern {
        if !re.is_match(&output) {
            return Ok(Verdict::UnmatchedFailure);
        }
    }
    Ok(Verdict::MatchedFailure)
}

fn contains_bytes(haystack: &[u8], needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    Regex::new(&regex::escape(needle)).is_ok_and(|re| re.is_match(haystack))
}
