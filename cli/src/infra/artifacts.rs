//! Infrastructure implementation of the `ArtifactStore` port.

use std::io::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::ArtifactStore;
use crate::domain::WorkerHandle;
use crate::domain::config::{archive_file_name, output_file_name};

/// Writes failure artifacts to a local directory and unmatched output to
/// the system temp directory.
pub struct FsArtifactStore {
    dir: PathBuf,
    temp_dir: PathBuf,
}

impl FsArtifactStore {
    /// Store named artifacts under `dir`, temp files under the OS temp dir.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            temp_dir: std::env::temp_dir(),
        }
    }

    /// Override where unmatched-failure temp files go.
    #[must_use]
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }
}

impl ArtifactStore for FsArtifactStore {
    type Archive = tokio::fs::File;

    async fn write_output(&self, worker: &WorkerHandle, output: &[u8]) -> Result<PathBuf> {
        let path = self.dir.join(output_file_name(&worker.id));
        tokio::fs::write(&path, output)
            .await
            .with_context(|| format!("cannot write {}", path.display()))?;
        Ok(path)
    }

    async fn write_unmatched(&self, worker: &WorkerHandle, output: &[u8]) -> Result<PathBuf> {
        let prefix = format!("{}-", worker.id);
        let temp_dir = self.temp_dir.clone();
        let output = output.to_vec();
        // Sessions share one task; keep blocking file I/O off it.
        tokio::task::spawn_blocking(move || {
            let mut file = tempfile::Builder::new()
                .prefix(&prefix)
                .suffix(".out")
                .tempfile_in(&temp_dir)
                .with_context(|| format!("cannot create temp file in {}", temp_dir.display()))?;
            file.write_all(&output)
                .with_context(|| format!("cannot write {}", file.path().display()))?;
            let (_, path) = file.keep().context("cannot keep temp file")?;
            Ok::<_, anyhow::Error>(path)
        })
        .await
        .context("temp file writer panicked")?
    }

    async fn create_archive(&self, worker: &WorkerHandle) -> Result<(PathBuf, Self::Archive)> {
        let path = self.dir.join(archive_file_name(&worker.id));
        let file = tokio::fs::File::create(&path)
            .await
            .with_context(|| format!("cannot create {}", path.display()))?;
        Ok((path, file))
    }
}
