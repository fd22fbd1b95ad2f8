//! # Store Module
//!
//! The collaborators the search engine reads from and writes to.
//!
//! ## Collaborators
//! - `MediaRepository` - lists the photos of a property
//! - `FeatureStore` - one `ImageFeatures` record per indexed photo
//! - `ByteFetcher` - retrieves raw image bytes for a photo URL
//!
//! ## Backends
//! - `SqliteStore` - persistent storage using SQLite (media + features)
//! - `InMemoryStore` - for tests and embedding
//! - `FileFetcher` - reads photos from the local filesystem

mod catalog;
mod fetcher;
mod memory;
mod sqlite;
mod traits;

pub use catalog::{Catalog, CatalogPhoto, CatalogProperty};
pub use fetcher::FileFetcher;
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{ByteFetcher, FeatureStore, MediaRepository};

use crate::core::features::ImageFeatures;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type PhotoId = String;
pub type PropertyId = String;

/// Listing lifecycle. Only active listings are searchable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    #[default]
    Active,
    Pending,
    Sold,
    Rented,
    Inactive,
}

impl PropertyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::Active => "active",
            PropertyStatus::Pending => "pending",
            PropertyStatus::Sold => "sold",
            PropertyStatus::Rented => "rented",
            PropertyStatus::Inactive => "inactive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(PropertyStatus::Active),
            "pending" => Some(PropertyStatus::Pending),
            "sold" => Some(PropertyStatus::Sold),
            "rented" => Some(PropertyStatus::Rented),
            "inactive" => Some(PropertyStatus::Inactive),
            _ => None,
        }
    }
}

/// How a property is offered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingType {
    Sale,
    Rent,
    ShortTermRent,
}

impl std::fmt::Display for ListingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListingType::Sale => write!(f, "sale"),
            ListingType::Rent => write!(f, "rent"),
            ListingType::ShortTermRent => write!(f, "short_term_rent"),
        }
    }
}

/// The parts of a property listing the candidate predicate looks at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySummary {
    pub id: PropertyId,
    pub status: PropertyStatus,
    pub listing_types: Vec<ListingType>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl PropertySummary {
    /// Whether this property is eligible as a search candidate
    pub fn matches(&self, filter: &CandidateFilter) -> bool {
        if self.status != PropertyStatus::Active {
            return false;
        }

        if let Some(wanted) = filter.listing_types.as_ref().filter(|w| !w.is_empty()) {
            if !self.listing_types.iter().any(|t| wanted.contains(t)) {
                return false;
            }
        }

        contains_ignore_case(self.city.as_deref(), filter.city.as_deref())
            && contains_ignore_case(self.country.as_deref(), filter.country.as_deref())
    }
}

/// `haystack` contains `needle`, ignoring case. A missing needle always matches.
fn contains_ignore_case(haystack: Option<&str>, needle: Option<&str>) -> bool {
    match needle {
        None => true,
        Some(needle) => haystack
            .map(|h| h.to_lowercase().contains(&needle.to_lowercase()))
            .unwrap_or(false),
    }
}

/// Predicate on the owning property of a candidate photo.
///
/// Active status is always required and is not part of the filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateFilter {
    /// Property must offer at least one of these
    pub listing_types: Option<Vec<ListingType>>,
    /// Case-insensitive substring of the property's city
    pub city: Option<String>,
    /// Case-insensitive substring of the property's country
    pub country: Option<String>,
}

/// Kind of media attached to a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    #[default]
    Photo,
    Video,
    FloorPlan,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
            MediaKind::FloorPlan => "floor_plan",
        }
    }
}

/// A media item owned by the media repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: PhotoId,
    pub property_id: PropertyId,
    pub kind: MediaKind,
    pub url: String,
    pub thumbnail_url: Option<String>,
}

/// A photo as listed for indexing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRef {
    pub photo_id: PhotoId,
    pub url: String,
    pub thumbnail_url: Option<String>,
}

/// The stored fingerprint of one indexed photo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageHashRecord {
    pub photo_id: PhotoId,
    /// Owning property, denormalized for candidate queries
    pub property_id: PropertyId,
    pub features: ImageFeatures,
    pub indexed_at: DateTime<Utc>,
}

/// An indexed photo considered during a search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub photo_id: PhotoId,
    pub property_id: PropertyId,
    pub features: ImageFeatures,
    pub url: String,
    pub thumbnail_url: Option<String>,
}

/// Index coverage
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IndexStats {
    /// Photos known to the store
    pub total_photos: usize,
    /// Photos with a stored fingerprint
    pub indexed_photos: usize,
    /// indexed / total as a percentage, 1 decimal
    pub coverage_percent: f64,
}

impl IndexStats {
    pub fn new(total_photos: usize, indexed_photos: usize) -> Self {
        let coverage_percent = if total_photos == 0 {
            0.0
        } else {
            crate::core::precision::round1(indexed_photos as f64 * 100.0 / total_photos as f64)
        };
        Self {
            total_photos,
            indexed_photos,
            coverage_percent,
        }
    }
}
