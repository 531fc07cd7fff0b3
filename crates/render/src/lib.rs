//! Template-driven certificate compositor.
//!
//! Given a [`TemplateDescriptor`](hamcert_types::TemplateDescriptor) and the
//! display strings for each role, the [`Compositor`] draws the background
//! full-bleed, lays out every populated field with its own font, size, color
//! and alignment, and serializes a single-page PDF with `lopdf`.
//!
//! Rendering is synchronous. Fonts are resolved per render call, so
//! concurrent renders share nothing mutable.

pub mod background;
mod compositor;
mod document;
mod error;
pub mod fonts;
mod page;

pub use background::DecodedBackground;
pub use compositor::{Compositor, PagePlan, PlacedField, RenderRequest, RenderedDocument};
pub use error::RenderError;
pub use fonts::{
    FontHandle, FontKey, FontMetrics, FontOutlines, FontResolver, ShapedGlyph, ShapedText,
};
