//! # Indexing Module
//!
//! Fingerprints the photos of a property and writes them to the feature store.
//!
//! ## Per-photo steps
//! 1. **Skip** - a stored record means the photo is already indexed
//! 2. **Fetch** - raw bytes through the `ByteFetcher`
//! 3. **Extract** - `FeatureExtractor` on the bytes
//! 4. **Store** - insert-if-absent into the `FeatureStore`
//!
//! A failed fetch or extraction is recorded on the outcome and the next
//! photo is processed. Batches also isolate whole properties from each other.

mod pipeline;

pub use pipeline::{
    BatchIndexingOutcome, IndexingFailure, IndexingOutcome, IndexingPipeline,
    IndexingPipelineBuilder, PropertyFailure,
};
