//! Asset providers for certificate rendering.
//!
//! - [`FilesystemAssetProvider`]: loads fonts and backgrounds from a directory tree
//! - [`InMemoryAssetProvider`]: re-exported from `hamcert-traits`

mod filesystem;

pub use filesystem::FilesystemAssetProvider;

pub use hamcert_traits::InMemoryAssetProvider;
