//! # Error Module
//!
//! Error types for the visual similarity search engine.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - photo ids, URLs, sizes, what went wrong
//! - **Query path aborts, indexing path collects** - callers decide
//!   what is fatal, the types only describe what happened

use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum VisualSearchError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Image processing error: {0}")]
    ImageProcessing(#[from] ImageProcessingError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Malformed uploads and malformed search filters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("No image file was provided")]
    MissingFile,

    #[error("Unsupported media type: {media_type} (expected jpeg, png, webp or gif)")]
    UnsupportedMediaType { media_type: String },

    #[error("File is too large: {size_bytes} bytes (maximum is {max_bytes} bytes)")]
    FileTooLarge { size_bytes: u64, max_bytes: u64 },

    #[error("Invalid minimum similarity: {value} (must be between 0 and 1)")]
    InvalidMinSimilarity { value: f64 },

    #[error("Invalid result limit: {value} (must be at least 1)")]
    InvalidLimit { value: usize },

    #[error("Invalid search filter: {0}")]
    MalformedFilter(String),
}

/// Errors that occur while decoding or resizing image bytes
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImageProcessingError {
    #[error("Image data is empty")]
    EmptyInput,

    #[error("Failed to decode image: {reason}")]
    DecodeFailed { reason: String },

    #[error("Image has zero width or height ({width}x{height})")]
    ZeroDimensions { width: u32, height: u32 },

    #[error("Failed to resize image: {reason}")]
    ResizeFailed { reason: String },
}

/// Errors raised by a byte fetcher while retrieving a photo
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Photo not found at {url}")]
    NotFound { url: String },

    #[error("Unsupported photo location: {url}")]
    UnsupportedUrl { url: String },

    #[error("Failed to read photo from {url}: {source}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch {url}: {reason}")]
    Failed { url: String, reason: String },
}

/// Errors raised by the feature store or the media/property repositories
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open store at {path}: {reason}")]
    OpenFailed { path: String, reason: String },

    #[error("Store query failed: {0}")]
    QueryFailed(String),

    #[error("Store lock was poisoned. Restart the process and try again.")]
    Poisoned,

    #[error("Failed to serialize feature data: {0}")]
    SerializationFailed(String),

    #[error("Property not found: {property_id}")]
    PropertyNotFound { property_id: String },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, VisualSearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_error_names_the_type() {
        let error = ValidationError::UnsupportedMediaType {
            media_type: "image/tiff".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("image/tiff"));
    }

    #[test]
    fn too_large_error_includes_sizes() {
        let error = ValidationError::FileTooLarge {
            size_bytes: 11 * 1024 * 1024,
            max_bytes: 10 * 1024 * 1024,
        };
        let message = error.to_string();
        assert!(message.contains("11534336"));
        assert!(message.contains("10485760"));
    }

    #[test]
    fn fetch_error_includes_url() {
        let error = FetchError::NotFound {
            url: "file:///photos/kitchen.jpg".to_string(),
        };
        assert!(error.to_string().contains("/photos/kitchen.jpg"));
    }

    #[test]
    fn top_level_error_wraps_sources() {
        let error: VisualSearchError = ImageProcessingError::EmptyInput.into();
        assert!(matches!(error, VisualSearchError::ImageProcessing(_)));
        assert!(error.to_string().contains("empty"));
    }
}
