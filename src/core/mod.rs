//! # Core Module
//!
//! The transport-agnostic visual similarity engine.
//!
//! ## Modules
//! - `imaging` - Decodes bytes and resizes pixels
//! - `features` - Computes pHash, dominant colors, aspect ratio and brightness
//! - `scoring` - Weighted similarity and explanations
//! - `store` - Media repository, feature store and byte fetcher collaborators
//! - `indexing` - Fingerprints the photos of properties
//! - `search` - Ranks indexed photos against a query image

pub mod features;
pub mod imaging;
pub mod indexing;
pub mod precision;
pub mod scoring;
pub mod search;
pub mod store;

// Re-export commonly used types
pub use features::{FeatureExtractor, ImageFeatures};
pub use indexing::{BatchIndexingOutcome, IndexingOutcome, IndexingPipeline};
pub use scoring::{Comparison, ScoreBreakdown, SimilarityScorer};
pub use search::{SearchConfig, SearchFilter, SearchOrchestrator, SearchResponse, SearchResult};
