//! Filesystem-backed asset provider.
//!
//! Every asset path is resolved under a single asset root. Absolute paths and
//! paths that climb out of the root (`..`) are rejected, so a template record
//! cannot make the renderer read arbitrary files.

use hamcert_traits::{AssetError, AssetProvider, SharedAssetData};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct FilesystemAssetProvider {
    root: PathBuf,
    canonical_root: Option<PathBuf>,
}

impl FilesystemAssetProvider {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        let canonical_root = root.canonicalize().ok();
        Self { root, canonical_root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps an asset path onto the filesystem, or `None` if it escapes the root.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path);
        if relative.is_absolute() {
            return None;
        }
        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_) | Component::RootDir))
        {
            return None;
        }

        let full = self.root.join(relative);

        // Symlinks may still point outside the root.
        if let (Ok(canonical), Some(root)) = (full.canonicalize(), self.canonical_root.as_ref()) {
            if !canonical.starts_with(root) {
                return None;
            }
            return Some(canonical);
        }

        Some(full)
    }
}

impl AssetProvider for FilesystemAssetProvider {
    fn load(&self, path: &str) -> Result<SharedAssetData, AssetError> {
        let full = self
            .resolve(path)
            .ok_or_else(|| AssetError::Rejected(path.to_string()))?;

        log::debug!("Reading asset {}", full.display());
        std::fs::read(&full).map(Arc::new).map_err(|e| match e.kind() {
            ErrorKind::NotFound => AssetError::NotFound(path.to_string()),
            _ => AssetError::LoadFailed {
                path: path.to_string(),
                message: e.to_string(),
            },
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_some_and(|p| p.is_file())
    }

    fn name(&self) -> &'static str {
        "FilesystemAssetProvider"
    }
}
