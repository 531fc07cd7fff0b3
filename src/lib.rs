//! Certificate generator for amateur radio events.
//!
//! The rendering engine lives in `hamcert-render`; this crate adds the pieces
//! around it: configuration, the two fixed legacy layouts, recipient records
//! from the document store, and batch rendering.
//!
//! ```ignore
//! use hamcert::{CertConfig, TemplateDescriptor};
//!
//! let config = CertConfig::from_file("hamcert.json".as_ref())?.with_env_overrides();
//! let descriptor = TemplateDescriptor::from_json(&std::fs::read_to_string("event.json")?)?;
//! let identity = hamcert::Identity::from_json(&std::fs::read_to_string("n0call.json")?)?;
//! config
//!     .compositor()
//!     .render_to_file(&descriptor, &identity.field_values(0), "n0call.pdf")?;
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod legacy;
pub mod record;

pub use batch::render_batch;
pub use config::CertConfig;
pub use error::CertError;
pub use legacy::{Band, LegacyTemplate};
pub use record::{Attributes, Identity};

pub use hamcert_assets::FilesystemAssetProvider;
pub use hamcert_render::{
    Compositor, PagePlan, PlacedField, RenderError, RenderRequest, RenderedDocument,
};
pub use hamcert_traits::{AssetError, AssetProvider, InMemoryAssetProvider};
pub use hamcert_types::{
    BackgroundImage, FieldStyle, FieldValues, ImageFormat, MM_TO_PT, Orientation, PageGeometry,
    PageSize, Rgb, Role, TemplateDescriptor, TextAlign, TextPosition,
};
