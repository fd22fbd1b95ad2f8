//! Search orchestration: extract, load candidates, score, dedupe, rank.

use super::{validate_upload, SearchConfig, SearchFilter, UploadedFile, MAX_LIMIT};
use crate::core::features::{FeatureExtractor, ImageFeatures};
use crate::core::precision::round3;
use crate::core::scoring::{ScoreBreakdown, SimilarityScorer};
use crate::core::store::{Candidate, FeatureStore, IndexStats};
use crate::error::{ValidationError, VisualSearchError};
use crate::events::{null_sender, Event, EventSender, SearchEvent};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// The photo that earned a property its place in the results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedPhoto {
    pub photo_id: String,
    pub url: String,
    pub thumbnail_url: Option<String>,
}

/// One ranked property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub property_id: String,
    /// Composite similarity, 3 decimals
    pub similarity: f64,
    /// Sub-scores, 3 decimals each
    pub breakdown: ScoreBreakdown,
    pub matched_photo: MatchedPhoto,
    /// Built from the unrounded sub-scores, so a color score shown as 0.800
    /// may still read "similar color palette"
    pub explanation: String,
}

/// Everything returned by a search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    /// Number of results returned
    pub total: usize,
    pub query_features: ImageFeatures,
    pub processing_time_ms: u64,
}

/// A candidate with its raw scores
struct Scored<'a> {
    candidate: &'a Candidate,
    breakdown: ScoreBreakdown,
    similarity: f64,
}

/// Builder for a search orchestrator
#[derive(Default)]
pub struct SearchOrchestratorBuilder {
    store: Option<Arc<dyn FeatureStore>>,
    config: SearchConfig,
    events: Option<EventSender>,
}

impl SearchOrchestratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feature store candidates are read from
    pub fn store(mut self, store: Arc<dyn FeatureStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Report progress on this channel
    pub fn events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    pub fn build(self) -> Result<SearchOrchestrator, VisualSearchError> {
        let store = self
            .store
            .ok_or_else(|| VisualSearchError::Config("search needs a feature store".to_string()))?;
        if self.config.default_limit == 0 || self.config.max_limit == 0 {
            return Err(VisualSearchError::Config(
                "result limits must be at least 1".to_string(),
            ));
        }
        if self.config.max_limit > MAX_LIMIT {
            return Err(VisualSearchError::Config(format!(
                "maximum result limit {} exceeds {MAX_LIMIT}",
                self.config.max_limit
            )));
        }
        if self.config.default_limit > self.config.max_limit {
            return Err(VisualSearchError::Config(format!(
                "default result limit {} exceeds maximum {}",
                self.config.default_limit, self.config.max_limit
            )));
        }
        if !(0.0..=1.0).contains(&self.config.min_similarity) {
            return Err(VisualSearchError::Config(format!(
                "minimum similarity {} is outside 0..=1",
                self.config.min_similarity
            )));
        }

        Ok(SearchOrchestrator {
            store,
            config: self.config,
            events: self.events.unwrap_or_else(null_sender),
        })
    }
}

/// Top-level entry point for visual similarity search
pub struct SearchOrchestrator {
    store: Arc<dyn FeatureStore>,
    config: SearchConfig,
    events: EventSender,
}

impl SearchOrchestrator {
    pub fn builder() -> SearchOrchestratorBuilder {
        SearchOrchestratorBuilder::new()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Check an upload against the configured type and size rules
    pub fn validate_upload(&self, file: Option<&UploadedFile>) -> Result<(), ValidationError> {
        validate_upload(file, &self.config)
    }

    /// Coverage of the underlying feature store
    pub fn stats(&self) -> Result<IndexStats, VisualSearchError> {
        Ok(self.store.stats()?)
    }

    /// Find the properties whose photos look most like `query_bytes`.
    ///
    /// At most one result per property, best first. An empty index yields
    /// an empty response rather than an error.
    pub fn find_similar(
        &self,
        query_bytes: &[u8],
        filter: &SearchFilter,
    ) -> Result<SearchResponse, VisualSearchError> {
        let start_time = Instant::now();
        let limits = filter.resolve(&self.config)?;

        let query_features = FeatureExtractor::extract(query_bytes)?;
        self.events.send(Event::Search(SearchEvent::Started {
            query_hash: query_features.p_hash.clone(),
        }));

        let candidates = self.store.query_candidates(&filter.candidate_filter())?;
        debug!(
            candidates = candidates.len(),
            p_hash = %query_features.p_hash,
            "Loaded search candidates"
        );
        self.events.send(Event::Search(SearchEvent::CandidatesLoaded {
            count: candidates.len(),
        }));

        let scored: Vec<Scored<'_>> = candidates
            .par_iter()
            .map(|candidate| {
                let breakdown = SimilarityScorer::score(&query_features, &candidate.features);
                Scored {
                    candidate,
                    similarity: breakdown.similarity(),
                    breakdown,
                }
            })
            .filter(|scored| scored.similarity >= limits.min_similarity)
            .collect();

        let mut ranked = best_per_property(scored);
        ranked.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.candidate.property_id.cmp(&b.candidate.property_id))
        });
        ranked.truncate(limits.limit);

        let results: Vec<SearchResult> = ranked.into_iter().map(to_result).collect();
        let processing_time_ms = start_time.elapsed().as_millis() as u64;

        info!(
            candidates = candidates.len(),
            results = results.len(),
            processing_time_ms,
            "Search completed"
        );
        self.events.send(Event::Search(SearchEvent::Completed {
            result_count: results.len(),
            processing_time_ms,
        }));

        Ok(SearchResponse {
            total: results.len(),
            results,
            query_features,
            processing_time_ms,
        })
    }
}

/// Keep the highest-scoring candidate of each property.
///
/// On a tie the candidate seen first wins.
fn best_per_property(scored: Vec<Scored<'_>>) -> Vec<Scored<'_>> {
    let mut best: HashMap<&str, Scored<'_>> = HashMap::new();
    for entry in scored {
        match best.entry(entry.candidate.property_id.as_str()) {
            Entry::Vacant(slot) => {
                slot.insert(entry);
            }
            Entry::Occupied(mut slot) => {
                if entry.similarity > slot.get().similarity {
                    slot.insert(entry);
                }
            }
        }
    }
    best.into_values().collect()
}

fn to_result(scored: Scored<'_>) -> SearchResult {
    let candidate = scored.candidate;
    SearchResult {
        property_id: candidate.property_id.clone(),
        similarity: round3(scored.similarity),
        breakdown: scored.breakdown.rounded(),
        matched_photo: MatchedPhoto {
            photo_id: candidate.photo_id.clone(),
            url: candidate.url.clone(),
            thumbnail_url: candidate.thumbnail_url.clone(),
        },
        explanation: scored.breakdown.explanation(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::{
        InMemoryStore, ListingType, MediaItem, MediaKind, PropertyStatus, PropertySummary,
    };
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;

    fn png() -> Vec<u8> {
        let image = RgbImage::from_fn(48, 32, |x, _| image::Rgb([(x * 5) as u8, 120, 30]));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    fn orchestrator() -> SearchOrchestrator {
        SearchOrchestrator::builder()
            .store(Arc::new(InMemoryStore::new()))
            .build()
            .unwrap()
    }

    #[test]
    fn builder_requires_store() {
        let result = SearchOrchestrator::builder().build();
        assert!(matches!(result, Err(VisualSearchError::Config(_))));
    }

    #[test]
    fn builder_rejects_zero_limit() {
        let result = SearchOrchestrator::builder()
            .store(Arc::new(InMemoryStore::new()))
            .config(SearchConfig::new().default_limit(0))
            .build();
        assert!(matches!(result, Err(VisualSearchError::Config(_))));
    }

    #[test]
    fn builder_rejects_limit_above_hard_cap() {
        let result = SearchOrchestrator::builder()
            .store(Arc::new(InMemoryStore::new()))
            .config(SearchConfig::new().max_limit(50))
            .build();
        assert!(matches!(result, Err(VisualSearchError::Config(_))));
    }

    #[test]
    fn builder_rejects_default_above_maximum() {
        let result = SearchOrchestrator::builder()
            .store(Arc::new(InMemoryStore::new()))
            .config(SearchConfig::new().max_limit(5).default_limit(8))
            .build();
        assert!(matches!(result, Err(VisualSearchError::Config(_))));
    }

    #[test]
    fn lower_configured_cap_limits_results() {
        let features = FeatureExtractor::extract(&png()).unwrap();
        let store = Arc::new(InMemoryStore::new());
        for i in 0..8 {
            let id = format!("p{i}");
            store
                .upsert_property(PropertySummary {
                    id: id.clone(),
                    status: PropertyStatus::Active,
                    listing_types: vec![ListingType::Sale],
                    city: None,
                    country: None,
                })
                .unwrap();
            store
                .upsert_media(MediaItem {
                    id: format!("{id}-1"),
                    property_id: id.clone(),
                    kind: MediaKind::Photo,
                    url: format!("{id}.jpg"),
                    thumbnail_url: None,
                })
                .unwrap();
            store.insert(&format!("{id}-1"), &id, &features).unwrap();
        }
        let orchestrator = SearchOrchestrator::builder()
            .store(store)
            .config(SearchConfig::new().max_limit(5).default_limit(5))
            .build()
            .unwrap();

        let filter = SearchFilter {
            limit: Some(30),
            ..Default::default()
        };
        let response = orchestrator.find_similar(&png(), &filter).unwrap();
        assert_eq!(response.total, 5);
    }

    #[test]
    fn empty_index_returns_no_results() {
        let response = orchestrator().find_similar(&png(), &SearchFilter::default()).unwrap();

        assert!(response.results.is_empty());
        assert_eq!(response.total, 0);
        assert_eq!(response.query_features.aspect_ratio, 1.5);
    }

    #[test]
    fn undecodable_query_is_fatal() {
        let result = orchestrator().find_similar(b"definitely not a png", &SearchFilter::default());
        assert!(matches!(result, Err(VisualSearchError::ImageProcessing(_))));
    }

    #[test]
    fn invalid_filter_is_rejected_before_decoding() {
        let filter = SearchFilter {
            min_similarity: Some(2.0),
            ..Default::default()
        };
        let result = orchestrator().find_similar(&[], &filter);
        assert!(matches!(result, Err(VisualSearchError::Validation(_))));
    }

    #[test]
    fn explanation_uses_unrounded_scores() {
        let candidate = Candidate {
            photo_id: "k1".to_string(),
            property_id: "p1".to_string(),
            features: ImageFeatures {
                p_hash: "0000000000000000".to_string(),
                dominant_colors: vec!["#000000".to_string()],
                aspect_ratio: 1.0,
                brightness: 0.0,
            },
            url: "k1.jpg".to_string(),
            thumbnail_url: None,
        };
        let breakdown = ScoreBreakdown {
            structural: 0.5,
            color_palette: 0.79961,
            composition: 0.5,
        };

        let result = to_result(Scored {
            candidate: &candidate,
            similarity: breakdown.similarity(),
            breakdown,
        });

        assert_eq!(result.breakdown.color_palette, 0.8);
        assert_eq!(result.explanation, "Similar property with similar color palette");
    }

    #[test]
    fn ties_keep_first_candidate_of_property() {
        let features = ImageFeatures {
            p_hash: "0000000000000000".to_string(),
            dominant_colors: vec!["#000000".to_string()],
            aspect_ratio: 1.0,
            brightness: 0.0,
        };
        let candidates: Vec<Candidate> = ["first", "second"]
            .iter()
            .map(|id| Candidate {
                photo_id: id.to_string(),
                property_id: "p1".to_string(),
                features: features.clone(),
                url: format!("{id}.jpg"),
                thumbnail_url: None,
            })
            .collect();
        let scored = candidates
            .iter()
            .map(|candidate| Scored {
                candidate,
                breakdown: SimilarityScorer::score(&features, &candidate.features),
                similarity: 1.0,
            })
            .collect();

        let best = best_per_property(scored);

        assert_eq!(best.len(), 1);
        assert_eq!(best[0].candidate.photo_id, "first");
    }
}
