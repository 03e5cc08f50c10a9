//! Swarm command: validate, launch the fleet, report what it found.

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Args};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::app::AppContext;
use crate::application::services::fleet;
use crate::domain::config::{DEFAULT_DEFLAKE, DEFAULT_INSTANCES, DEFAULT_VERBOSITY, ROOT_ENV};
use crate::domain::{CleanupMode, SwarmConfig, SwarmError};
use crate::infra::artifacts::FsArtifactStore;
use crate::infra::gomote::DEFAULT_GOMOTE;

/// Arguments for a swarm run.
#[derive(Args)]
pub struct SwarmArgs {
    /// Builder type every instance is created as
    #[arg(value_name = "INSTANCE_TYPE")]
    pub instance_type: String,

    /// Command (and arguments) to run on every instance
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,

    /// Number of instances to run in parallel
    #[arg(short, long, default_value_t = DEFAULT_INSTANCES)]
    pub instances: u32,

    /// Environment variable passed to the command (repeatable)
    #[arg(short, long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Only count failures whose output matches this regexp
    #[arg(long = "match", value_name = "REGEX")]
    pub pattern: Option<String>,

    /// Destroy instances at start, at exit, or never
    #[arg(long = "clean", value_name = "MODE", default_value_t = CleanupMode::Off)]
    pub cleanup: CleanupMode,

    /// 0 is quiet, 2 and above also prints unmatched failure output
    #[arg(short, long, default_value_t = DEFAULT_VERBOSITY)]
    pub verbosity: u8,

    /// Attempts allowed for creating and pushing to an instance
    #[arg(long, default_value_t = DEFAULT_DEFLAKE)]
    pub deflake: u32,

    /// Keep other instances running after a matching failure
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    pub keep_going: bool,

    /// Directory that receives failure output and archives
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Backend program used to manage instances
    #[arg(long, value_name = "PROG", env = "SWARM_GOMOTE", default_value = DEFAULT_GOMOTE)]
    pub gomote: String,
}

impl SwarmArgs {
    /// Validate the arguments into an immutable fleet configuration.
    ///
    /// # Errors
    ///
    /// Returns an error for a bad `--env` entry, an uncompilable `--match`
    /// pattern, or zero instances.
    pub fn into_config(self) -> Result<SwarmConfig> {
        let mut config = SwarmConfig::new(self.instance_type, self.command)
            .with_env(self.env)?
            .with_pattern(self.pattern.as_deref())?
            .with_instances(self.instances)?;
        config.deflake = self.deflake;
        config.cleanup = self.cleanup;
        config.keep_going = self.keep_going;
        config.verbosity = self.verbosity;
        config.artifact_dir = self.out_dir;
        Ok(config)
    }
}

/// Entry point for `swarm`.
///
/// # Errors
///
/// Returns an error if validation or cleanup fails, or if any session hits a
/// hard error. A matched failure is not an error.
pub async fn run(app: &AppContext, args: SwarmArgs) -> Result<()> {
    let config = args.into_config()?;

    if std::env::var_os(ROOT_ENV).is_none() {
        tracing::warn!("{ROOT_ENV} is not set, the backend may have nothing to push");
    }

    if config.command.is_empty() {
        if config.cleanup != CleanupMode::Start {
            return Err(SwarmError::MissingCommand.into());
        }
        fleet::prepare(&app.backend, &config).await?;
        app.output
            .success(&format!("Cleaned up {} instances.", config.instance_type));
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let interrupt = watch_interrupt(cancel.clone());
    let artifacts = FsArtifactStore::new(&config.artifact_dir);
    let result = fleet::run_fleet(&app.backend, &artifacts, &config, &cancel).await;
    interrupt.abort();

    let report = result?;
    app.renderer().render_report(&report)
}

/// Cancel the fleet on Ctrl-C. Sessions stop at their next boundary.
fn watch_interrupt(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, stopping all instances");
            cancel.cancel();
        }
    })
}
