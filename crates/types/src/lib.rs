//! Data model for template-driven certificate documents.
//!
//! A [`TemplateDescriptor`] describes a background image and an ordered set of
//! [`FieldStyle`]s keyed by semantic [`Role`]. Descriptors are plain data: they
//! are loaded once (usually from a document store), never mutated, and shared
//! freely between concurrent renders.

pub mod color;
pub mod geometry;
pub mod template;

pub use color::Rgb;
pub use geometry::{Orientation, PageGeometry, PageSize, Rect, TextPosition, MM_TO_PT};
pub use template::{
    BackgroundImage, FieldStyle, FieldValues, ImageFormat, ImageSource, Role, TemplateDescriptor,
    TemplateError, TextAlign,
};
