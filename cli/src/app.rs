//! Application context passed to command handlers.

use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::gomote::GomoteBackend;
use crate::output::{HumanRenderer, OutputContext, Renderer};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Constructed once in `Cli::run()` and passed by reference to the handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Backend that creates and drives workers.
    pub backend: GomoteBackend<TokioCommandRunner>,
}

impl AppContext {
    /// Construct an `AppContext` from top-level flags and the backend program.
    #[must_use]
    pub fn new(flags: &OutputFlags, gomote: &str) -> Self {
        let mode = if flags.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        Self {
            output: OutputContext::new(flags.no_color, flags.quiet),
            mode,
            backend: GomoteBackend::default_runner(gomote),
        }
    }

    /// Renderer for the current output mode.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json,
        }
    }
}
