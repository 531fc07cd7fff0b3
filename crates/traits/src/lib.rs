pub mod asset;

pub use asset::{
    AssetError, AssetProvider, InMemoryAssetProvider, SharedAssetData, font_asset_paths,
    join_asset_path,
};
