use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    capture::device::CaptureRequest,
    composite::{compositor::CompositeStyle, layout::PlacementParams},
    foundation::error::{TryOnError, TryOnResult},
};

/// Everything tunable about a try-on session. Every field has a default, so an empty JSON
/// object is a valid config.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TryOnConfig {
    pub placement: PlacementParams,
    pub style: CompositeStyle,
    pub capture: CaptureRequest,
    /// File name prefix for downloads and snapshots.
    pub download_prefix: String,
    /// Directory for the cart and wishlist files.
    pub storage_dir: PathBuf,
}

impl Default for TryOnConfig {
    fn default() -> Self {
        Self {
            placement: PlacementParams::default(),
            style: CompositeStyle::default(),
            capture: CaptureRequest::default(),
            download_prefix: "aura".to_string(),
            storage_dir: PathBuf::from(".aura"),
        }
    }
}

impl TryOnConfig {
    pub fn from_json(json: &str) -> TryOnResult<Self> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|e| TryOnError::serde(format!("config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> TryOnResult<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> TryOnResult<()> {
        self.placement.validate()?;
        self.style.validate()?;
        self.capture.validate()?;
        let prefix_ok = !self.download_prefix.is_empty()
            && self
                .download_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !prefix_ok {
            return Err(TryOnError::validation(format!(
                "download_prefix must be non-empty [A-Za-z0-9_-], got '{}'",
                self.download_prefix
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
