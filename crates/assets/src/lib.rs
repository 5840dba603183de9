//! Asset cache: texture references keyed by path and shared across bodies.
//!
//! The cache never decodes anything. It hands out stable [`AssetId`]s for
//! paths so several bodies (a planet and its cloud shell, every moon using the
//! same rock texture) reference one entry, and rendering services resolve the
//! id back to a path if they sample textures at all.
//!
//! # Layout
//! Ids are the first eight bytes of the SHA-256 of the normalized path, so the
//! same path maps to the same id across runs and manifests.

use orrery_common::AssetId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// What kind of asset an entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Texture,
}

/// One cached asset reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEntry {
    pub path: String,
    pub kind: AssetKind,
    /// Number of registrations sharing this entry.
    pub refs: u32,
}

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("asset not found: {0:?}")]
    NotFound(AssetId),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetCache {
    entries: BTreeMap<AssetId, AssetEntry>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a texture path, returning the shared id for it.
    pub fn texture(&mut self, path: &str) -> AssetId {
        let path = normalize(path);
        let id = path_id(&path);
        self.entries
            .entry(id)
            .and_modify(|e| e.refs += 1)
            .or_insert_with(|| {
                tracing::debug!(%path, "cached texture reference");
                AssetEntry {
                    path,
                    kind: AssetKind::Texture,
                    refs: 1,
                }
            });
        id
    }

    pub fn get(&self, id: AssetId) -> Option<&AssetEntry> {
        self.entries.get(&id)
    }

    /// Path registered for `id`.
    pub fn path(&self, id: AssetId) -> Result<&str, AssetError> {
        self.entries
            .get(&id)
            .map(|e| e.path.as_str())
            .ok_or(AssetError::NotFound(id))
    }

    pub fn entries(&self) -> impl Iterator<Item = (AssetId, &AssetEntry)> {
        self.entries.iter().map(|(id, e)| (*id, e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose file does not exist under `root`.
    pub fn missing_under(&self, root: impl AsRef<Path>) -> Vec<&AssetEntry> {
        let root = root.as_ref();
        self.entries
            .values()
            .filter(|e| !root.join(&e.path).is_file())
            .collect()
    }

    /// Resolve `id` to a filesystem path under `root`.
    pub fn resolve(&self, root: impl AsRef<Path>, id: AssetId) -> Result<PathBuf, AssetError> {
        Ok(root.as_ref().join(self.path(id)?))
    }

    /// Save the cache as a JSON manifest.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AssetError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load a cache from a JSON manifest.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let file = std::fs::File::open(path)?;
        let cache: Self = serde_json::from_reader(file)?;
        Ok(cache)
    }
}

fn normalize(path: &str) -> String {
    let path = path.trim().replace('\\', "/");
    path.strip_prefix("./").unwrap_or(path.as_str()).to_string()
}

fn path_id(path: &str) -> AssetId {
    let mut hasher = Sha256::new();
    hasher.update(path.as_bytes());
    let result = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&result[..8]);
    AssetId(u64::from_le_bytes(bytes))
}
