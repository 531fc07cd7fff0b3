use hamcert_render::RenderError;
use hamcert_types::TemplateError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the certificate generator as a whole.
#[derive(Error, Debug)]
pub enum CertError {
    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("Invalid template: {0}")]
    Template(#[from] TemplateError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration file {path} is invalid: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("Unknown band '{0}'; expected \"40 m\" or \"2 m\"")]
    UnknownBand(String),
}
