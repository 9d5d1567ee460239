use std::{
    borrow::Cow,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};

use crate::foundation::error::{TryOnError, TryOnResult};

/// Where an image comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    /// Encoded bytes already in memory (uploads).
    Bytes(Arc<Vec<u8>>),
    /// `data:image/...;base64,...` URI.
    DataUri(String),
    /// Local file.
    Path(PathBuf),
    /// Remote `http(s)` URL.
    Url(String),
}

impl ImageSource {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(Arc::new(bytes.into()))
    }

    /// Classify a URI string as it appears in a product record or on the command line.
    pub fn parse(uri: &str) -> Self {
        let trimmed = uri.trim();
        if trimmed.starts_with("data:") {
            Self::DataUri(trimmed.to_string())
        } else if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else if let Some(path) = trimmed.strip_prefix("file://") {
            Self::Path(PathBuf::from(path))
        } else {
            Self::Path(PathBuf::from(trimmed))
        }
    }

    /// Short label for logs; never includes payload bytes.
    pub fn describe(&self) -> String {
        match self {
            Self::Bytes(b) => format!("<{} bytes>", b.len()),
            Self::DataUri(u) => format!("<data uri, {} chars>", u.len()),
            Self::Path(p) => p.display().to_string(),
            Self::Url(u) => u.clone(),
        }
    }
}

/// Decode the payload of a base64 `data:` URI.
pub fn decode_data_uri(uri: &str) -> TryOnResult<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| TryOnError::validation("not a data uri"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| TryOnError::validation("data uri has no payload"))?;
    if !meta.ends_with(";base64") {
        return Err(TryOnError::validation(
            "only base64-encoded data uris are supported",
        ));
    }
    BASE64_STANDARD
        .decode(payload.trim())
        .map_err(|e| TryOnError::validation(format!("invalid base64 in data uri: {e}")))
}

/// Fetches the encoded bytes behind an [`ImageSource`].
///
/// Injected into overlay selection so product images can come from anywhere the host
/// application can reach.
pub trait ImageLoader: Send + Sync {
    fn load<'a>(&self, source: &'a ImageSource) -> TryOnResult<Cow<'a, [u8]>>;
}

/// Loader for in-memory bytes, `data:` URIs, local files and (with the `remote-images`
/// feature) http(s) URLs.
#[derive(Debug, Default, Clone)]
pub struct DefaultImageLoader {
    root: Option<PathBuf>,
}

impl DefaultImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `root` instead of the working directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl ImageLoader for DefaultImageLoader {
    fn load<'a>(&self, source: &'a ImageSource) -> TryOnResult<Cow<'a, [u8]>> {
        match source {
            ImageSource::Bytes(b) => Ok(Cow::Borrowed(b.as_slice())),
            ImageSource::DataUri(uri) => decode_data_uri(uri).map(Cow::Owned),
            ImageSource::Path(p) => {
                let path = self.resolve(p);
                let bytes = std::fs::read(&path)
                    .with_context(|| format!("read image '{}'", path.display()))?;
                Ok(Cow::Owned(bytes))
            }
            ImageSource::Url(url) => fetch_url(url).map(Cow::Owned),
        }
    }
}

#[cfg(feature = "remote-images")]
fn fetch_url(url: &str) -> TryOnResult<Vec<u8>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(20))
        .build()
        .context("build http client")?;
    let resp = client
        .get(url)
        .send()
        .with_context(|| format!("fetch '{url}'"))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(TryOnError::validation(format!(
            "fetch '{url}' returned HTTP {status}"
        )));
    }
    let bytes = resp.bytes().with_context(|| format!("read body of '{url}'"))?;
    Ok(bytes.to_vec())
}

#[cfg(not(feature = "remote-images"))]
fn fetch_url(url: &str) -> TryOnResult<Vec<u8>> {
    Err(TryOnError::validation(format!(
        "cannot fetch '{url}': remote images require the 'remote-images' feature"
    )))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
