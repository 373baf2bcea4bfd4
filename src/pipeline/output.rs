use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Run timestamp used in output file names, e.g. `20240131_235959`
pub fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Writes collection artifacts as pretty JSON files into one directory
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the output directory if needed
    pub async fn prepare(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating output directory {}", self.dir.display()))
    }

    pub async fn write_json<T: Serialize + ?Sized>(&self, file_name: &str, data: &T) -> Result<PathBuf> {
        let path = self.dir.join(file_name);
        let json = serde_json::to_string_pretty(data).context("serializing output")?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }

    /// `{source}_{ts}_{stage}.json`
    pub async fn write_stage<T: Serialize + ?Sized>(
        &self,
        source: &str,
        ts: &str,
        stage: &str,
        data: &T,
    ) -> Result<PathBuf> {
        let path = self
            .write_json(&format!("{source}_{ts}_{stage}.json"), data)
            .await?;
        info!("💾 Saved {} data to {}", stage, path.display());
        Ok(path)
    }
}
