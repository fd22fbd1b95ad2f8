//! In-memory store backend for testing.

use super::{
    Candidate, CandidateFilter, Catalog, FeatureStore, ImageHashRecord, MediaItem, MediaKind,
    MediaRepository, PhotoRef, PropertySummary,
};
use crate::core::features::ImageFeatures;
use crate::error::StoreError;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

#[derive(Default)]
struct State {
    properties: HashMap<String, PropertySummary>,
    /// Media in insertion order, so photos list in display order
    media: Vec<MediaItem>,
    /// Keyed by photo id; ordered so candidate scans are reproducible
    records: BTreeMap<String, ImageHashRecord>,
}

/// In-memory media repository and feature store
///
/// Useful for testing and scenarios where persistence isn't needed.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated from a catalog
    pub fn from_catalog(catalog: Catalog) -> Result<Self, StoreError> {
        let store = Self::new();
        store.import_catalog(catalog)?;
        Ok(store)
    }

    /// Add or replace properties and media from a catalog
    pub fn import_catalog(&self, catalog: Catalog) -> Result<(), StoreError> {
        let (properties, media) = catalog.into_parts();
        for property in properties {
            self.upsert_property(property)?;
        }
        for item in media {
            self.upsert_media(item)?;
        }
        Ok(())
    }

    pub fn upsert_property(&self, property: PropertySummary) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| StoreError::Poisoned)?;
        state.properties.insert(property.id.clone(), property);
        Ok(())
    }

    pub fn upsert_media(&self, item: MediaItem) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| StoreError::Poisoned)?;
        match state.media.iter_mut().find(|m| m.id == item.id) {
            Some(existing) => *existing = item,
            None => state.media.push(item),
        }
        Ok(())
    }

    /// The stored record for a photo, if indexed
    pub fn record(&self, photo_id: &str) -> Result<Option<ImageHashRecord>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state.records.get(photo_id).cloned())
    }
}

impl MediaRepository for InMemoryStore {
    fn list_photos(&self, property_id: &str) -> Result<Vec<PhotoRef>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;

        if !state.properties.contains_key(property_id) {
            return Err(StoreError::PropertyNotFound {
                property_id: property_id.to_string(),
            });
        }

        Ok(state
            .media
            .iter()
            .filter(|m| m.property_id == property_id && m.kind == MediaKind::Photo)
            .map(|m| PhotoRef {
                photo_id: m.id.clone(),
                url: m.url.clone(),
                thumbnail_url: m.thumbnail_url.clone(),
            })
            .collect())
    }
}

impl FeatureStore for InMemoryStore {
    fn has(&self, photo_id: &str) -> Result<bool, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state.records.contains_key(photo_id))
    }

    fn insert(
        &self,
        photo_id: &str,
        property_id: &str,
        features: &ImageFeatures,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().map_err(|_| StoreError::Poisoned)?;
        state
            .records
            .entry(photo_id.to_string())
            .or_insert_with(|| ImageHashRecord {
                photo_id: photo_id.to_string(),
                property_id: property_id.to_string(),
                features: features.clone(),
                indexed_at: Utc::now(),
            });
        Ok(())
    }

    fn query_candidates(&self, filter: &CandidateFilter) -> Result<Vec<Candidate>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        let media: HashMap<&str, &MediaItem> =
            state.media.iter().map(|m| (m.id.as_str(), m)).collect();

        Ok(state
            .records
            .values()
            .filter(|record| {
                state
                    .properties
                    .get(&record.property_id)
                    .is_some_and(|property| property.matches(filter))
            })
            .filter_map(|record| {
                // Records whose photo has been removed are not searchable
                let item = media.get(record.photo_id.as_str())?;
                Some(Candidate {
                    photo_id: record.photo_id.clone(),
                    property_id: record.property_id.clone(),
                    features: record.features.clone(),
                    url: item.url.clone(),
                    thumbnail_url: item.thumbnail_url.clone(),
                })
            })
            .collect())
    }

    fn count_all(&self) -> Result<usize, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state
            .media
            .iter()
            .filter(|m| m.kind == MediaKind::Photo)
            .count())
    }

    fn count_indexed(&self) -> Result<usize, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(state.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::{ListingType, PropertyStatus};

    fn features(p_hash: &str) -> ImageFeatures {
        ImageFeatures {
            p_hash: p_hash.to_string(),
            dominant_colors: vec!["#C0C0C0".to_string()],
            aspect_ratio: 1.5,
            brightness: 100.0,
        }
    }

    fn seeded_store() -> InMemoryStore {
        let catalog = Catalog::from_json_str(
            r#"{"properties": [
                {"id": "p1", "listing_types": ["sale"], "city": "Lisbon", "photos": [
                    {"id": "a", "url": "a.jpg", "thumbnail_url": "a_t.jpg"},
                    {"id": "tour", "url": "tour.mp4", "kind": "video"},
                    {"id": "b", "url": "b.jpg"}
                ]},
                {"id": "p2", "status": "sold", "photos": [{"id": "c", "url": "c.jpg"}]}
            ]}"#,
        )
        .unwrap();
        InMemoryStore::from_catalog(catalog).unwrap()
    }

    #[test]
    fn list_photos_skips_other_media() {
        let store = seeded_store();
        let photos = store.list_photos("p1").unwrap();

        let ids: Vec<_> = photos.iter().map(|p| p.photo_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(photos[0].thumbnail_url.as_deref(), Some("a_t.jpg"));
    }

    #[test]
    fn list_photos_for_unknown_property_fails() {
        let store = seeded_store();
        assert!(matches!(
            store.list_photos("missing"),
            Err(StoreError::PropertyNotFound { .. })
        ));
    }

    #[test]
    fn insert_is_idempotent() {
        let store = seeded_store();
        store.insert("a", "p1", &features("ffffffffffffffff")).unwrap();
        store.insert("a", "p1", &features("0000000000000000")).unwrap();

        assert!(store.has("a").unwrap());
        assert_eq!(store.count_indexed().unwrap(), 1);
        assert_eq!(
            store.record("a").unwrap().unwrap().features.p_hash,
            "ffffffffffffffff"
        );
    }

    #[test]
    fn candidates_require_active_matching_property() {
        let store = seeded_store();
        store.insert("a", "p1", &features("ffffffffffffffff")).unwrap();
        store.insert("c", "p2", &features("ffffffffffffffff")).unwrap();

        let all = store.query_candidates(&CandidateFilter::default()).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].photo_id, "a");
        assert_eq!(all[0].url, "a.jpg");

        let rentals = CandidateFilter {
            listing_types: Some(vec![ListingType::Rent]),
            ..Default::default()
        };
        assert!(store.query_candidates(&rentals).unwrap().is_empty());
    }

    #[test]
    fn counts_photos_and_records() {
        let store = seeded_store();
        store.insert("b", "p1", &features("ffffffffffffffff")).unwrap();

        assert_eq!(store.count_all().unwrap(), 3);
        assert_eq!(store.count_indexed().unwrap(), 1);
        let stats = store.stats().unwrap();
        assert_eq!(stats.coverage_percent, 33.3);
    }

    #[test]
    fn upsert_property_replaces_status() {
        let store = seeded_store();
        store.insert("a", "p1", &features("ffffffffffffffff")).unwrap();
        store
            .upsert_property(PropertySummary {
                id: "p1".to_string(),
                status: PropertyStatus::Inactive,
                listing_types: vec![],
                city: None,
                country: None,
            })
            .unwrap();

        assert!(store
            .query_candidates(&CandidateFilter::default())
            .unwrap()
            .is_empty());
    }
}
