//! Indexing pipeline implementation.

use crate::core::features::FeatureExtractor;
use crate::core::store::{ByteFetcher, FeatureStore, MediaRepository, PhotoRef};
use crate::error::VisualSearchError;
use crate::events::{null_sender, Event, EventSender, IndexEvent, IndexSummary};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A photo that could not be indexed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexingFailure {
    pub photo_id: String,
    pub error: String,
}

/// Result of indexing one property
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexingOutcome {
    pub property_id: String,
    /// Newly indexed plus already indexed photos
    pub indexed_count: usize,
    pub failed_count: usize,
    pub indexed_photo_ids: Vec<String>,
    pub failures: Vec<IndexingFailure>,
}

/// A property whose photos could not even be listed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyFailure {
    pub property_id: String,
    pub error: String,
}

/// Result of indexing several properties
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchIndexingOutcome {
    pub indexed_count: usize,
    pub failed_count: usize,
    pub outcomes: Vec<IndexingOutcome>,
    pub property_failures: Vec<PropertyFailure>,
}

/// What happened to a single photo
enum PhotoStatus {
    AlreadyIndexed,
    Indexed,
    Failed(String),
}

/// Builder for an indexing pipeline
#[derive(Default)]
pub struct IndexingPipelineBuilder {
    media: Option<Arc<dyn MediaRepository>>,
    store: Option<Arc<dyn FeatureStore>>,
    fetcher: Option<Arc<dyn ByteFetcher>>,
    events: Option<EventSender>,
}

impl IndexingPipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Where the photo list of a property comes from
    pub fn media(mut self, media: Arc<dyn MediaRepository>) -> Self {
        self.media = Some(media);
        self
    }

    /// Where fingerprints are written
    pub fn store(mut self, store: Arc<dyn FeatureStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// How photo bytes are retrieved
    pub fn fetcher(mut self, fetcher: Arc<dyn ByteFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Report progress on this channel
    pub fn events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    pub fn build(self) -> Result<IndexingPipeline, VisualSearchError> {
        let missing = |what: &str| VisualSearchError::Config(format!("indexing pipeline needs a {what}"));
        Ok(IndexingPipeline {
            media: self.media.ok_or_else(|| missing("media repository"))?,
            store: self.store.ok_or_else(|| missing("feature store"))?,
            fetcher: self.fetcher.ok_or_else(|| missing("byte fetcher"))?,
            events: self.events.unwrap_or_else(null_sender),
        })
    }
}

/// Extracts and stores features for the unindexed photos of properties
pub struct IndexingPipeline {
    media: Arc<dyn MediaRepository>,
    store: Arc<dyn FeatureStore>,
    fetcher: Arc<dyn ByteFetcher>,
    events: EventSender,
}

impl IndexingPipeline {
    pub fn builder() -> IndexingPipelineBuilder {
        IndexingPipelineBuilder::new()
    }

    /// Index every photo of one property.
    ///
    /// Only a failure to list the property's photos is returned as an error;
    /// per-photo problems end up in `IndexingOutcome::failures`.
    pub fn index_property(&self, property_id: &str) -> Result<IndexingOutcome, VisualSearchError> {
        let start_time = Instant::now();
        let photos = self.media.list_photos(property_id)?;

        debug!(property_id, photos = photos.len(), "Indexing property");
        self.events.send(Event::Index(IndexEvent::Started {
            property_id: property_id.to_string(),
            total_photos: photos.len(),
        }));

        let mut outcome = IndexingOutcome {
            property_id: property_id.to_string(),
            ..Default::default()
        };

        for photo in &photos {
            match self.index_photo(property_id, photo) {
                PhotoStatus::AlreadyIndexed => {
                    self.events.send(Event::Index(IndexEvent::PhotoSkipped {
                        property_id: property_id.to_string(),
                        photo_id: photo.photo_id.clone(),
                    }));
                    outcome.indexed_count += 1;
                    outcome.indexed_photo_ids.push(photo.photo_id.clone());
                }
                PhotoStatus::Indexed => {
                    self.events.send(Event::Index(IndexEvent::PhotoIndexed {
                        property_id: property_id.to_string(),
                        photo_id: photo.photo_id.clone(),
                    }));
                    outcome.indexed_count += 1;
                    outcome.indexed_photo_ids.push(photo.photo_id.clone());
                }
                PhotoStatus::Failed(error) => {
                    warn!(property_id, photo_id = %photo.photo_id, %error, "Failed to index photo");
                    self.events.send(Event::Index(IndexEvent::PhotoFailed {
                        property_id: property_id.to_string(),
                        photo_id: photo.photo_id.clone(),
                        message: error.clone(),
                    }));
                    outcome.failed_count += 1;
                    outcome.failures.push(IndexingFailure {
                        photo_id: photo.photo_id.clone(),
                        error,
                    });
                }
            }
        }

        let duration_ms = start_time.elapsed().as_millis() as u64;
        info!(
            property_id,
            indexed = outcome.indexed_count,
            failed = outcome.failed_count,
            duration_ms,
            "Indexed property"
        );
        self.events.send(Event::Index(IndexEvent::Completed(IndexSummary {
            property_id: property_id.to_string(),
            indexed_count: outcome.indexed_count,
            failed_count: outcome.failed_count,
            duration_ms,
        })));

        Ok(outcome)
    }

    /// Index several properties one after another.
    ///
    /// A property whose photos cannot be listed is recorded and skipped.
    pub fn index_properties<S: AsRef<str>>(&self, property_ids: &[S]) -> BatchIndexingOutcome {
        let mut batch = BatchIndexingOutcome::default();

        for property_id in property_ids {
            let property_id = property_id.as_ref();
            match self.index_property(property_id) {
                Ok(outcome) => {
                    batch.indexed_count += outcome.indexed_count;
                    batch.failed_count += outcome.failed_count;
                    batch.outcomes.push(outcome);
                }
                Err(e) => {
                    warn!(property_id, error = %e, "Skipping property");
                    batch.property_failures.push(PropertyFailure {
                        property_id: property_id.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        batch
    }

    fn index_photo(&self, property_id: &str, photo: &PhotoRef) -> PhotoStatus {
        match self.store.has(&photo.photo_id) {
            Ok(true) => return PhotoStatus::AlreadyIndexed,
            Ok(false) => {}
            Err(e) => return PhotoStatus::Failed(e.to_string()),
        }

        let bytes = match self.fetcher.fetch(&photo.url) {
            Ok(bytes) => bytes,
            Err(e) => return PhotoStatus::Failed(e.to_string()),
        };

        let features = match FeatureExtractor::extract(&bytes) {
            Ok(features) => features,
            Err(e) => return PhotoStatus::Failed(e.to_string()),
        };

        match self.store.insert(&photo.photo_id, property_id, &features) {
            Ok(()) => PhotoStatus::Indexed,
            Err(e) => PhotoStatus::Failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::{
        InMemoryStore, ListingType, MediaItem, MediaKind, PropertyStatus, PropertySummary,
    };
    use crate::error::FetchError;
    use crate::events::EventChannel;
    use image::{ImageFormat, RgbImage};
    use std::collections::HashMap;
    use std::io::Cursor;

    /// Serves canned bytes by URL
    struct MapFetcher(HashMap<String, Vec<u8>>);

    impl ByteFetcher for MapFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.0.get(url).cloned().ok_or_else(|| FetchError::NotFound {
                url: url.to_string(),
            })
        }
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 4) as u8, (y * 4) as u8, 90])
        });
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    fn store_with_photos(photos: &[(&str, &str)]) -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        store
            .upsert_property(PropertySummary {
                id: "p1".to_string(),
                status: PropertyStatus::Active,
                listing_types: vec![ListingType::Sale],
                city: None,
                country: None,
            })
            .unwrap();
        for (id, url) in photos {
            store
                .upsert_media(MediaItem {
                    id: id.to_string(),
                    property_id: "p1".to_string(),
                    kind: MediaKind::Photo,
                    url: url.to_string(),
                    thumbnail_url: None,
                })
                .unwrap();
        }
        store
    }

    fn pipeline(store: &Arc<InMemoryStore>, files: &[(&str, Vec<u8>)]) -> IndexingPipeline {
        let fetcher = MapFetcher(
            files
                .iter()
                .map(|(url, bytes)| (url.to_string(), bytes.clone()))
                .collect(),
        );
        IndexingPipeline::builder()
            .media(store.clone())
            .store(store.clone())
            .fetcher(Arc::new(fetcher))
            .build()
            .unwrap()
    }

    #[test]
    fn builder_requires_collaborators() {
        let result = IndexingPipeline::builder()
            .fetcher(Arc::new(MapFetcher(HashMap::new())))
            .build();
        assert!(matches!(result, Err(VisualSearchError::Config(_))));
    }

    #[test]
    fn indexes_every_photo() {
        let store = store_with_photos(&[("a", "a.png"), ("b", "b.png")]);
        let pipeline = pipeline(&store, &[("a.png", png(64, 48)), ("b.png", png(40, 40))]);

        let outcome = pipeline.index_property("p1").unwrap();

        assert_eq!(outcome.indexed_count, 2);
        assert_eq!(outcome.failed_count, 0);
        assert_eq!(outcome.indexed_photo_ids, vec!["a", "b"]);
        let record = store.record("a").unwrap().unwrap();
        assert_eq!(record.property_id, "p1");
        assert_eq!(record.features.aspect_ratio, 1.333);
    }

    #[test]
    fn bad_photo_does_not_stop_the_rest() {
        let store = store_with_photos(&[("a", "a.png"), ("gone", "gone.png"), ("junk", "junk.png")]);
        let pipeline = pipeline(
            &store,
            &[("a.png", png(32, 32)), ("junk.png", b"not an image".to_vec())],
        );

        let outcome = pipeline.index_property("p1").unwrap();

        assert_eq!(outcome.indexed_count, 1);
        assert_eq!(outcome.failed_count, 2);
        let failed: Vec<_> = outcome.failures.iter().map(|f| f.photo_id.as_str()).collect();
        assert_eq!(failed, vec!["gone", "junk"]);
        assert!(outcome.failures[0].error.contains("gone.png"));
        assert!(!store.has("junk").unwrap());
    }

    #[test]
    fn second_run_counts_existing_records() {
        let store = store_with_photos(&[("a", "a.png")]);
        let pipeline = pipeline(&store, &[("a.png", png(32, 32))]);

        pipeline.index_property("p1").unwrap();
        let first = store.record("a").unwrap().unwrap();
        let second = pipeline.index_property("p1").unwrap();

        assert_eq!(second.indexed_count, 1);
        assert_eq!(second.indexed_photo_ids, vec!["a"]);
        assert_eq!(store.record("a").unwrap().unwrap(), first);
    }

    #[test]
    fn batch_isolates_unknown_property() {
        let store = store_with_photos(&[("a", "a.png")]);
        let pipeline = pipeline(&store, &[("a.png", png(32, 32))]);

        let batch = pipeline.index_properties(&["missing", "p1"]);

        assert_eq!(batch.indexed_count, 1);
        assert_eq!(batch.outcomes.len(), 1);
        assert_eq!(batch.property_failures.len(), 1);
        assert_eq!(batch.property_failures[0].property_id, "missing");
    }

    #[test]
    fn emits_progress_events() {
        let store = store_with_photos(&[("a", "a.png"), ("b", "b.png")]);
        let (sender, receiver) = EventChannel::new();
        let pipeline = IndexingPipeline::builder()
            .media(store.clone())
            .store(store.clone())
            .fetcher(Arc::new(MapFetcher(
                [("a.png".to_string(), png(32, 32))].into_iter().collect(),
            )))
            .events(sender)
            .build()
            .unwrap();

        pipeline.index_property("p1").unwrap();
        drop(pipeline);

        let events: Vec<_> = receiver.iter().collect();
        assert!(matches!(
            events.first(),
            Some(Event::Index(IndexEvent::Started { total_photos: 2, .. }))
        ));
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::Index(IndexEvent::PhotoFailed { photo_id, .. }) if photo_id == "b")));
        assert!(matches!(
            events.last(),
            Some(Event::Index(IndexEvent::Completed(summary))) if summary.indexed_count == 1
        ));
    }
}
