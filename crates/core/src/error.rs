//! Error types for slide deck generation.

use crate::types::SlideType;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading inputs or generating slides.
#[derive(Error, Debug)]
pub enum Error {
    /// Template, AI content or image pool JSON could not be decoded.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Rich-text markup inside an element could not be parsed or written back.
    #[error("Markup error: {0}")]
    MarkupError(String),

    /// No template slide of the requested type is available.
    #[error("No template available for slide type '{slide_type}'")]
    NoTemplate {
        /// The slide type that had an empty template pool.
        slide_type: SlideType,
    },

    /// Input that parsed but cannot be used.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
