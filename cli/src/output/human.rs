//! Human-readable terminal renderer.

use crate::domain::{FailureReport, FleetOutcome, FleetReport};
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the summary printed when the fleet stops.
    pub fn render_report(&self, report: &FleetReport) {
        match report.outcome() {
            FleetOutcome::Clean => self.ctx.success("No failure observed."),
            FleetOutcome::FailureFound => {
                for failure in &report.failures {
                    self.render_failure(failure);
                }
            }
        }
        let mut tally = format!("{} launched", report.launched);
        if report.cancelled > 0 {
            tally.push_str(&format!(", {} cancelled", report.cancelled));
        }
        if report.setup_failed > 0 {
            tally.push_str(&format!(", {} failed to start", report.setup_failed));
        }
        self.ctx.kv("Sessions:", &tally);
        if report.setup_failed > 0 && report.setup_failed == report.launched {
            self.ctx
                .warn("No instance could be set up. Try raising --deflake.");
        }
    }

    fn render_failure(&self, failure: &FailureReport) {
        self.ctx.warn(&format!(
            "Failure on {} (run {}).",
            failure.worker, failure.run
        ));
        match &failure.output_path {
            Some(path) => self.ctx.kv("Output:", &path.display().to_string()),
            None => self.ctx.kv("Output:", "not written (see log)"),
        }
        match &failure.archive_path {
            Some(path) => self.ctx.kv("Archive:", &path.display().to_string()),
            None => self.ctx.kv("Archive:", "not downloaded (see log)"),
        }
    }
}
