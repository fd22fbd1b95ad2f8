//! # Search Module
//!
//! Answers "which listings have photos that look like this one?".
//!
//! ## Flow
//! 1. Validate the filter (and, at the transport edge, the upload)
//! 2. Extract query features once
//! 3. Load indexed candidates of active properties matching the filter
//! 4. Score candidates in parallel with rayon
//! 5. Drop results under the threshold, keep the best photo per property
//! 6. Sort by similarity and truncate to the limit

mod config;
mod filter;
mod orchestrator;
mod upload;

pub use config::{
    SearchConfig, DEFAULT_LIMIT, DEFAULT_MIN_SIMILARITY, MAX_LIMIT, MAX_UPLOAD_BYTES,
};
pub use filter::{ResolvedLimits, SearchFilter};
pub use orchestrator::{
    MatchedPhoto, SearchOrchestrator, SearchOrchestratorBuilder, SearchResponse, SearchResult,
};
pub use upload::{validate_upload, UploadedFile};
