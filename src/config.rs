//! Generator configuration.

use crate::error::CertError;
use hamcert_assets::FilesystemAssetProvider;
use hamcert_render::Compositor;
use hamcert_types::PageGeometry;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable that overrides [`CertConfig::asset_root`].
pub const ASSET_ROOT_ENV: &str = "HAMCERT_ASSET_ROOT";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CertConfig {
    /// Directory that font directories and background paths are resolved against.
    pub asset_root: PathBuf,
    pub page: PageGeometry,
    pub pdf_version: String,
}

impl Default for CertConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            page: PageGeometry::default(),
            pdf_version: "1.7".to_string(),
        }
    }
}

impl CertConfig {
    /// Loads a JSON configuration file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, CertError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| CertError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Applies overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`, which maps a variable name to its value.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(ASSET_ROOT_ENV).filter(|v| !v.trim().is_empty()) {
            log::debug!("{} overrides asset root with {}", ASSET_ROOT_ENV, root);
            self.asset_root = PathBuf::from(root);
        }
        self
    }

    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = root.into();
        self
    }

    /// Builds a compositor reading assets from `asset_root`.
    pub fn compositor(&self) -> Compositor {
        Compositor::new(Arc::new(FilesystemAssetProvider::new(&self.asset_root)), self.page)
            .with_pdf_version(self.pdf_version.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hamcert_types::{Orientation, PageSize};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn defaults_to_landscape_a4_in_current_directory() {
        let config = CertConfig::default();
        assert_eq!(config.asset_root, PathBuf::from("."));
        assert_eq!(config.page.dimensions_mm(), (297.0, 210.0));
        assert_eq!(config.pdf_version, "1.7");
    }

    #[test]
    fn loads_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hamcert.json");
        fs::write(
            &path,
            r#"{
                "asset_root": "/srv/certs",
                "page": { "size": "A5", "orientation": "portrait" }
            }"#,
        )
        .unwrap();

        let config = CertConfig::from_file(&path).unwrap();
        assert_eq!(config.asset_root, PathBuf::from("/srv/certs"));
        assert_eq!(config.page, PageGeometry::new(PageSize::A5, Orientation::Portrait));
        assert_eq!(config.pdf_version, "1.7");
    }

    #[test]
    fn invalid_file_names_the_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        match CertConfig::from_file(&path) {
            Err(CertError::Config { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn environment_overrides_asset_root() {
        let config = CertConfig::default()
            .with_overrides_from(|key| (key == ASSET_ROOT_ENV).then(|| "/opt/assets".to_string()));
        assert_eq!(config.asset_root, PathBuf::from("/opt/assets"));

        let untouched = CertConfig::default().with_overrides_from(|_| Some("  ".to_string()));
        assert_eq!(untouched.asset_root, PathBuf::from("."));
    }
}
