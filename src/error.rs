//! Error handling for the careermate application

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CareerMateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The uploaded bytes are not a usable PDF (corrupt, encrypted, or zero pages).
    #[error("Document error: {0}")]
    Document(String),

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("PDF text extraction error: {0}")]
    PdfExtraction(String),

    #[error("Rendering error: {0}")]
    Rendering(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, CareerMateError>;

/// Command parsing errors are reported as invalid input
impl From<anyhow::Error> for CareerMateError {
    fn from(err: anyhow::Error) -> Self {
        CareerMateError::InvalidInput(err.to_string())
    }
}

impl From<reqwest::Error> for CareerMateError {
    fn from(err: reqwest::Error) -> Self {
        CareerMateError::Network(err.to_string())
    }
}

impl From<image::ImageError> for CareerMateError {
    fn from(err: image::ImageError) -> Self {
        CareerMateError::Rendering(err.to_string())
    }
}
