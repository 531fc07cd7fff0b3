use hamcert_types::{ImageFormat, Role};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Font '{family}' could not be resolved in '{asset_dir}': {reason}")]
    FontResolution {
        family: String,
        asset_dir: String,
        reason: String,
    },

    #[error("Background image (declared {format}) could not be decoded: {reason}")]
    ImageDecode { format: ImageFormat, reason: String },

    #[error("Template '{template}' has no field style for role '{role}'")]
    MissingFieldStyle { role: Role, template: String },

    #[error("Field '{role}' has an invalid style: {reason}")]
    InvalidFieldStyle { role: Role, reason: String },

    #[error("Failed to write document to {sink}: {source}")]
    OutputWrite {
        sink: String,
        source: std::io::Error,
    },

    #[error("PDF generation error: {0}")]
    Pdf(String),
}

impl RenderError {
    pub(crate) fn font(family: &str, asset_dir: &str, reason: impl ToString) -> Self {
        RenderError::FontResolution {
            family: family.to_string(),
            asset_dir: asset_dir.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn image(format: ImageFormat, reason: impl ToString) -> Self {
        RenderError::ImageDecode { format, reason: reason.to_string() }
    }
}

impl From<lopdf::Error> for RenderError {
    fn from(err: lopdf::Error) -> Self {
        RenderError::Pdf(err.to_string())
    }
}
