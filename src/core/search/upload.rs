//! Upload validation, run before any bytes are decoded.

use super::SearchConfig;
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// What the transport layer knows about an uploaded file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub media_type: String,
    pub size_bytes: u64,
}

/// Reject missing, wrongly-typed, or oversized uploads
pub fn validate_upload(
    file: Option<&UploadedFile>,
    config: &SearchConfig,
) -> Result<(), ValidationError> {
    let file = file.ok_or(ValidationError::MissingFile)?;

    if !config.accepts_media_type(&file.media_type) {
        return Err(ValidationError::UnsupportedMediaType {
            media_type: file.media_type.clone(),
        });
    }

    if file.size_bytes > config.max_upload_bytes {
        return Err(ValidationError::FileTooLarge {
            size_bytes: file.size_bytes,
            max_bytes: config.max_upload_bytes,
        });
    }

    Ok(())
}
