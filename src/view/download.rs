use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::{DateTime, Utc};

use crate::foundation::error::TryOnResult;

/// `<prefix>-tryon-<YYYYMMDD-HHMMSS-mmm>.png`, in UTC.
pub fn snapshot_file_name(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{prefix}-tryon-{}.png", at.format("%Y%m%d-%H%M%S-%3f"))
}

/// Write PNG bytes into `dir`, creating it if needed. Returns the full path.
pub fn write_png(dir: &Path, file_name: &str, png: &[u8]) -> TryOnResult<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory '{}'", dir.display()))?;
    let path = dir.join(file_name);
    std::fs::write(&path, png).with_context(|| format!("write '{}'", path.display()))?;
    tracing::info!(path = %path.display(), bytes = png.len(), "png written");
    Ok(path)
}

#[cfg(test)]
#[path = "../../tests/unit/view/download.rs"]
mod tests;
