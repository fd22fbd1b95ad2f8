//! Collaborator trait definitions.

use super::{Candidate, CandidateFilter, IndexStats, PhotoRef};
use crate::core::features::ImageFeatures;
use crate::error::{FetchError, StoreError};

/// Lists the photos belonging to a property
pub trait MediaRepository: Send + Sync {
    /// Photo-type media of `property_id`, in display order.
    ///
    /// Videos, floor plans and other media kinds are not returned.
    fn list_photos(&self, property_id: &str) -> Result<Vec<PhotoRef>, StoreError>;
}

/// Persists one fingerprint per indexed photo
pub trait FeatureStore: Send + Sync {
    /// Whether a fingerprint exists for this photo (the only "is indexed" signal)
    fn has(&self, photo_id: &str) -> Result<bool, StoreError>;

    /// Store a fingerprint if none exists for this photo yet.
    ///
    /// An existing record is left untouched.
    fn insert(
        &self,
        photo_id: &str,
        property_id: &str,
        features: &ImageFeatures,
    ) -> Result<(), StoreError>;

    /// Indexed photos whose owning property is active and matches `filter`
    fn query_candidates(&self, filter: &CandidateFilter) -> Result<Vec<Candidate>, StoreError>;

    /// Number of photos known to the store, indexed or not
    fn count_all(&self) -> Result<usize, StoreError>;

    /// Number of photos with a stored fingerprint
    fn count_indexed(&self) -> Result<usize, StoreError>;

    /// Coverage summary built from the two counts
    fn stats(&self) -> Result<IndexStats, StoreError> {
        Ok(IndexStats::new(self.count_all()?, self.count_indexed()?))
    }
}

/// Retrieves raw image bytes for a URL.
///
/// Timeouts and retries are the implementation's business; a failure is
/// just a returned `FetchError`.
pub trait ByteFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}
