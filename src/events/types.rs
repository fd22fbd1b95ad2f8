//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};

/// All events emitted by indexing and search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Indexing pipeline events
    Index(IndexEvent),
    /// Search orchestrator events
    Search(SearchEvent),
}

/// Events while indexing the photos of a property
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IndexEvent {
    /// Indexing of a property has started
    Started {
        property_id: String,
        total_photos: usize,
    },
    /// Features were extracted and stored for a photo
    PhotoIndexed { property_id: String, photo_id: String },
    /// The photo already had a record, nothing was extracted
    PhotoSkipped { property_id: String, photo_id: String },
    /// Fetching or extraction failed; indexing continues
    PhotoFailed {
        property_id: String,
        photo_id: String,
        message: String,
    },
    /// Indexing of a property finished
    Completed(IndexSummary),
}

/// Totals reported when a property finishes indexing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSummary {
    pub property_id: String,
    pub indexed_count: usize,
    pub failed_count: usize,
    pub duration_ms: u64,
}

/// Events while answering a similarity search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SearchEvent {
    /// Query features have been extracted
    Started { query_hash: String },
    /// Candidates matching the filter were loaded
    CandidatesLoaded { count: usize },
    /// Ranking finished
    Completed {
        result_count: usize,
        processing_time_ms: u64,
    },
}
