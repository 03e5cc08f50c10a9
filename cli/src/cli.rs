//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::Parser;

use crate::app::{AppContext, OutputFlags};
use crate::commands;

/// Run a command on a fleet of remote builders until it fails
#[derive(Parser)]
#[command(name = "swarm", version)]
pub struct Cli {
    /// Print the fleet report as JSON
    #[arg(long)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", value_parser = clap::builder::FalseyValueParser::new())]
    pub no_color: bool,

    #[command(flatten)]
    pub swarm: commands::run::SwarmArgs,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if validation, cleanup, or any session fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            json,
            no_color,
            swarm,
        } = self;
        crate::logging::init(swarm.verbosity);
        let app = AppContext::new(
            &OutputFlags {
                no_color,
                quiet: swarm.verbosity == 0,
                json,
            },
            &swarm.gomote,
        );
        commands::run::run(&app, swarm).await
    }
}
