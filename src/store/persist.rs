use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use anyhow::Context as _;

use crate::foundation::error::{TryOnError, TryOnResult};

pub const CART_KEY: &str = "aura-cart";
pub const WISHLIST_KEY: &str = "aura-wishlist";

/// Durable string-keyed storage for serialized collections.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> TryOnResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> TryOnResult<()>;
    fn remove(&self, key: &str) -> TryOnResult<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> TryOnResult<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> TryOnResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> TryOnResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key under a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> TryOnResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(TryOnError::validation(format!(
                "invalid storage key '{key}'"
            )));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> TryOnResult<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TryOnError::persistence(format!(
                "read '{}': {e}",
                path.display()
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> TryOnResult<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create storage dir '{}'", self.dir.display()))
            .map_err(|e| TryOnError::persistence(format!("{e:#}")))?;
        // Readers only ever see a complete file.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)
            .and_then(|()| std::fs::rename(&tmp, &path))
            .map_err(|e| TryOnError::persistence(format!("write '{}': {e}", path.display())))
    }

    fn remove(&self, key: &str) -> TryOnResult<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TryOnError::persistence(format!(
                "remove '{}': {e}",
                path.display()
            ))),
        }
    }
}

/// Load a JSON collection; missing, unreadable or corrupt data yields an empty one.
pub(crate) fn load_collection<T: serde::de::DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Vec<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(key, "stored collection unreadable, starting empty: {e}");
            return Vec::new();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(key, "stored collection is corrupt, starting empty: {e}");
            Vec::new()
        }
    }
}

pub(crate) fn save_collection<T: serde::Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    items: &[T],
) -> TryOnResult<()> {
    let json = serde_json::to_string(items).map_err(|e| TryOnError::serde(e.to_string()))?;
    store.set(key, &json).map_err(|e| match e {
        TryOnError::Persistence(_) => e,
        other => TryOnError::persistence(other.to_string()),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/store/persist.rs"]
mod tests;
