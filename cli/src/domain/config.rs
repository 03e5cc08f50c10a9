//! Fleet configuration and its validators.
//!
//! Pure functions only, no I/O. The CLI
//! builds one `SwarmConfig` and every session borrows it immutably.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use regex::bytes::Regex;

use crate::domain::error::SwarmError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const DEFAULT_INSTANCES: u32 = 10;
pub const DEFAULT_DEFLAKE: u32 = 3;
pub const DEFAULT_VERBOSITY: u8 = 2;

/// Environment variable the backend reads to find the tree to push.
pub const ROOT_ENV: &str = "GOROOT";

// ── Cleanup mode ─────────────────────────────────────────────────────────────

/// When workers get destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupMode {
    /// Never destroy anything.
    #[default]
    Off,
    /// Destroy every existing worker of the target type before starting.
    Start,
    /// Destroy each session's own worker when the session ends.
    Exit,
}

impl CleanupMode {
    pub const VARIANTS: &'static [&'static str] = &["off", "start", "exit"];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Start => "start",
            Self::Exit => "exit",
        }
    }
}

impl FromStr for CleanupMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(Self::Off),
            "start" => Ok(Self::Start),
            "exit" => Ok(Self::Exit),
            other => Err(format!(
                "invalid cleanup mode '{other}' (expected one of: {})",
                Self::VARIANTS.join(", ")
            )),
        }
    }
}

impl std::fmt::Display for CleanupMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Config ───────────────────────────────────────────────────────────────────

/// Immutable per-fleet configuration shared by every session.
#[derive(Debug, Clone)]
pub struct SwarmConfig {
    /// Instance type every worker is created as.
    pub instance_type: String,
    /// Command and arguments to run on each worker.
    pub command: Vec<String>,
    /// `KEY=VALUE` pairs forwarded in order, duplicates included.
    pub env: Vec<String>,
    /// Number of concurrent sessions.
    pub instances: u32,
    /// Attempts allowed for create and provision.
    pub deflake: u32,
    pub cleanup: CleanupMode,
    /// Keep other sessions running after a matched failure.
    pub keep_going: bool,
    /// Only failures whose output matches count.
    pub pattern: Option<Regex>,
    pub verbosity: u8,
    /// Directory that receives `<id>.out` and `<id>.tar.gz`.
    pub artifact_dir: PathBuf,
}

impl SwarmConfig {
    /// Configuration with defaults for everything but the instance type and
    /// the command.
    #[must_use]
    pub fn new(instance_type: impl Into<String>, command: Vec<String>) -> Self {
        Self {
            instance_type: instance_type.into(),
            command,
            env: Vec::new(),
            instances: DEFAULT_INSTANCES,
            deflake: DEFAULT_DEFLAKE,
            cleanup: CleanupMode::Off,
            keep_going: false,
            pattern: None,
            verbosity: DEFAULT_VERBOSITY,
            artifact_dir: PathBuf::from("."),
        }
    }

    /// Set the forwarded environment after validating every entry.
    ///
    /// # Errors
    ///
    /// Returns `SwarmError::InvalidEnv` for the first malformed entry.
    pub fn with_env(mut self, env: Vec<String>) -> Result<Self> {
        for entry in &env {
            validate_env_var(entry)?;
        }
        self.env = env;
        Ok(self)
    }

    /// Set the failure pattern. An empty pattern means "no pattern".
    ///
    /// # Errors
    ///
    /// Returns `SwarmError::InvalidPattern` if the regexp does not compile.
    pub fn with_pattern(mut self, pattern: Option<&str>) -> Result<Self> {
        self.pattern = match pattern {
            Some(p) if !p.is_empty() => Some(compile_pattern(p)?),
            _ => None,
        };
        Ok(self)
    }

    /// Set the number of concurrent sessions.
    ///
    /// # Errors
    ///
    /// Returns `SwarmError::NoInstances` for zero.
    pub fn with_instances(mut self, instances: u32) -> Result<Self> {
        if instances == 0 {
            return Err(SwarmError::NoInstances.into());
        }
        self.instances = instances;
        Ok(self)
    }

    /// Check the config is runnable: a fleet needs something to run.
    ///
    /// # Errors
    ///
    /// Returns `SwarmError::MissingCommand` when the command is empty.
    pub fn ensure_command(&self) -> Result<()> {
        if self.command.is_empty() {
            return Err(SwarmError::MissingCommand.into());
        }
        Ok(())
    }
}

// ── Artifact names ───────────────────────────────────────────────────────────

/// File name of the combined-output artifact for a worker.
#[must_use]
pub fn output_file_name(worker_id: &str) -> String {
    format!("{worker_id}.out")
}

/// File name of the working-directory archive for a worker.
#[must_use]
pub fn archive_file_name(worker_id: &str) -> String {
    format!("{worker_id}.tar.gz")
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a `KEY=VALUE` environment entry. The value may be empty or
/// contain further `=` characters.
///
/// # Errors
///
/// Returns an error if there is no `=` or the key is empty.
pub fn validate_env_var(entry: &str) -> Result<()> {
    match entry.split_once('=') {
        Some((key, _)) if !key.is_empty() => Ok(()),
        _ => Err(SwarmError::InvalidEnv(entry.to_string()).into()),
    }
}

/// Compiles a failure pattern over raw output bytes.
///
/// # Errors
///
/// Returns an error if the regexp is invalid.
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| SwarmError::InvalidPattern(e.to_string()).into())
}

// ── Unit tests ───────────────────────────────────────────────────────────────
