//! JSON catalog of properties and their photos.
//!
//! ```json
//! {
//!   "properties": [
//!     {
//!       "id": "prop-1",
//!       "status": "active",
//!       "listing_types": ["sale"],
//!       "city": "Lisbon",
//!       "country": "Portugal",
//!       "photos": [{ "id": "photo-1", "url": "photos/prop-1/living.jpg" }]
//!     }
//!   ]
//! }
//! ```

use super::{ListingType, MediaItem, MediaKind, PropertyStatus, PropertySummary};
use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    pub properties: Vec<CatalogProperty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogProperty {
    pub id: String,
    #[serde(default)]
    pub status: PropertyStatus,
    #[serde(default)]
    pub listing_types: Vec<ListingType>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub photos: Vec<CatalogPhoto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogPhoto {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub kind: MediaKind,
}

impl Catalog {
    pub fn from_json_str(json: &str) -> Result<Self, StoreError> {
        serde_json::from_str(json).map_err(|e| StoreError::SerializationFailed(e.to_string()))
    }

    pub fn from_json_file(path: &Path) -> Result<Self, StoreError> {
        let json = std::fs::read_to_string(path).map_err(|e| StoreError::OpenFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(&json)
    }

    /// Flatten into property summaries and media items
    pub fn into_parts(self) -> (Vec<PropertySummary>, Vec<MediaItem>) {
        let mut properties = Vec::with_capacity(self.properties.len());
        let mut media = Vec::new();

        for property in self.properties {
            media.extend(property.photos.into_iter().map(|photo| MediaItem {
                id: photo.id,
                property_id: property.id.clone(),
                kind: photo.kind,
                url: photo.url,
                thumbnail_url: photo.thumbnail_url,
            }));
            properties.push(PropertySummary {
                id: property.id,
                status: property.status,
                listing_types: property.listing_types,
                city: property.city,
                country: property.country,
            });
        }

        (properties, media)
    }
}
