//! Write-only run log: one text file per generated artifact.

use anyhow::{Context, Result};
use chrono::DateTime;
use chrono_tz::Tz;
use std::path::{Path, PathBuf};

/// `{dir}/{artifact}_{YYYYmmdd_HHMMSS}.txt`
pub fn log_path(dir: &Path, artifact: &str, now: &DateTime<Tz>) -> PathBuf {
    dir.join(format!("{}_{}.txt", artifact, now.format("%Y%m%d_%H%M%S")))
}

/// Save `content` under `dir`, creating the directory if needed.
pub fn save_to_log(dir: &Path, artifact: &str, now: &DateTime<Tz>, content: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let path = log_path(dir, artifact, now);
    std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!("Saved {} to {}", artifact, path.display());
    Ok(path)
}
