//! AssetProvider trait for abstracting font and image loading.
//!
//! Templates refer to assets by relative paths (a font directory plus a family
//! name, or a background image path). The compositor resolves those paths
//! through an `AssetProvider`, so it never touches the filesystem directly.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Font file extensions tried, in order, for a family name.
const FONT_EXTENSIONS: [&str; 2] = ["ttf", "otf"];

#[derive(Error, Debug, Clone)]
pub enum AssetError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Asset path rejected (outside the asset root): {0}")]
    Rejected(String),

    #[error("Failed to load asset '{path}': {message}")]
    LoadFailed { path: String, message: String },
}

/// Shared asset bytes.
pub type SharedAssetData = Arc<Vec<u8>>;

/// Joins a directory and a file name into an asset path using `/`.
pub fn join_asset_path(dir: &str, file: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() || dir == "." {
        file.to_string()
    } else {
        format!("{}/{}", dir, file)
    }
}

/// Candidate paths for a font family inside `dir`, in lookup order.
pub fn font_asset_paths(dir: &str, family: &str) -> Vec<String> {
    FONT_EXTENSIONS
        .iter()
        .map(|ext| join_asset_path(dir, &format!("{}.{}", family, ext)))
        .collect()
}

/// A source of template assets (font files, background images).
///
/// Implementations must be safe to share between concurrent renders.
pub trait AssetProvider: Send + Sync + Debug {
    /// Load the asset at `path`.
    fn load(&self, path: &str) -> Result<SharedAssetData, AssetError>;

    /// Whether `path` can be loaded.
    fn exists(&self, path: &str) -> bool;

    /// A short label for log lines and error messages.
    fn name(&self) -> &'static str;

    /// Loads the first candidate that exists, returning its path and bytes.
    ///
    /// Errors other than `NotFound` stop the search immediately.
    fn load_first(&self, candidates: &[String]) -> Result<(String, SharedAssetData), AssetError> {
        for path in candidates {
            match self.load(path) {
                Ok(data) => return Ok((path.clone(), data)),
                Err(AssetError::NotFound(_)) => {
                    log::trace!("{}: no asset at {}", self.name(), path);
                }
                Err(e) => return Err(e),
            }
        }
        Err(AssetError::NotFound(candidates.join(", ")))
    }
}

/// An asset provider backed by a map, for tests and for assets that were
/// already fetched from a document store.
#[derive(Debug, Default)]
pub struct InMemoryAssetProvider {
    assets: RwLock<HashMap<String, SharedAssetData>>,
}

impl InMemoryAssetProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `data` under `path`, replacing any previous asset.
    pub fn insert(
        &self,
        path: impl Into<String>,
        data: impl Into<SharedAssetData>,
    ) -> Result<(), AssetError> {
        let path = path.into();
        let mut assets = self.assets.write().map_err(|_| AssetError::LoadFailed {
            path: path.clone(),
            message: "asset store lock poisoned".to_string(),
        })?;
        assets.insert(path, data.into());
        Ok(())
    }

    /// Registers a font file for `family` under `dir` as `<dir>/<family>.ttf`.
    pub fn insert_font(
        &self,
        dir: &str,
        family: &str,
        data: impl Into<SharedAssetData>,
    ) -> Result<(), AssetError> {
        self.insert(join_asset_path(dir, &format!("{}.ttf", family)), data)
    }

    pub fn len(&self) -> usize {
        self.assets.read().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AssetProvider for InMemoryAssetProvider {
    fn load(&self, path: &str) -> Result<SharedAssetData, AssetError> {
        let assets = self.assets.read().map_err(|_| AssetError::LoadFailed {
            path: path.to_string(),
            message: "asset store lock poisoned".to_string(),
        })?;
        assets
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(path.to_string()))
    }

    fn exists(&self, path: &str) -> bool {
        self.assets.read().map(|a| a.contains_key(path)).unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "InMemoryAssetProvider"
    }
}
