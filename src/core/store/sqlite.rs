//! SQLite store backend for persistent storage.

use super::{
    Candidate, CandidateFilter, Catalog, FeatureStore, ListingType, MediaItem, MediaKind,
    MediaRepository, PhotoRef, PropertyStatus, PropertySummary,
};
use crate::core::features::ImageFeatures;
use crate::error::StoreError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS properties (
        id TEXT PRIMARY KEY,
        status TEXT NOT NULL,
        listing_types TEXT NOT NULL,
        city TEXT,
        country TEXT
    );
    CREATE TABLE IF NOT EXISTS media (
        id TEXT PRIMARY KEY,
        property_id TEXT NOT NULL,
        kind TEXT NOT NULL,
        url TEXT NOT NULL,
        thumbnail_url TEXT,
        position INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_media_property ON media(property_id);
    CREATE TABLE IF NOT EXISTS image_features (
        photo_id TEXT PRIMARY KEY,
        property_id TEXT NOT NULL,
        p_hash TEXT NOT NULL,
        dominant_colors TEXT NOT NULL,
        aspect_ratio REAL NOT NULL,
        brightness REAL NOT NULL,
        indexed_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_features_property ON image_features(property_id);
";

/// SQLite-backed media repository and feature store
///
/// Uses WAL (Write-Ahead Logging) mode so searches can read while
/// indexing writes.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

fn query_failed(e: rusqlite::Error) -> StoreError {
    StoreError::QueryFailed(e.to_string())
}

impl SqliteStore {
    /// Open or create a store database at the given path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let open_failed = |reason: String| StoreError::OpenFailed {
            path: path.display().to_string(),
            reason,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| open_failed(e.to_string()))?;
        }

        let conn = Connection::open(path).map_err(|e| open_failed(e.to_string()))?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(query_failed)?;

        Self::with_connection(conn, path.to_path_buf())
    }

    /// Open a throwaway in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::OpenFailed {
            path: ":memory:".to_string(),
            reason: e.to_string(),
        })?;
        Self::with_connection(conn, PathBuf::from(":memory:"))
    }

    fn with_connection(conn: Connection, db_path: PathBuf) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA).map_err(query_failed)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Add or replace every property and media item of a catalog in one transaction.
    ///
    /// Returns (properties, media items) written.
    pub fn import_catalog(&self, catalog: Catalog) -> Result<(usize, usize), StoreError> {
        let (properties, media) = catalog.into_parts();
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(query_failed)?;

        for property in &properties {
            let listing_types = serde_json::to_string(&property.listing_types)
                .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;
            tx.execute(
                "INSERT OR REPLACE INTO properties (id, status, listing_types, city, country)
                 VALUES (?, ?, ?, ?, ?)",
                params![
                    property.id,
                    property.status.as_str(),
                    listing_types,
                    property.city,
                    property.country,
                ],
            )
            .map_err(query_failed)?;
        }

        for (position, item) in media.iter().enumerate() {
            Self::write_media(&tx, item, position as i64)?;
        }

        tx.commit().map_err(query_failed)?;
        Ok((properties.len(), media.len()))
    }

    fn write_media(conn: &Connection, item: &MediaItem, position: i64) -> Result<(), StoreError> {
        conn.execute(
            "INSERT OR REPLACE INTO media (id, property_id, kind, url, thumbnail_url, position)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                item.id,
                item.property_id,
                item.kind.as_str(),
                item.url,
                item.thumbnail_url,
                position,
            ],
        )
        .map_err(query_failed)?;
        Ok(())
    }

    /// Every property id, in id order
    pub fn property_ids(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT id FROM properties ORDER BY id")
            .map_err(query_failed)?;
        let ids = stmt
            .query_map([], |row| row.get(0))
            .map_err(query_failed)?
            .collect::<Result<Vec<String>, _>>()
            .map_err(query_failed)?;
        Ok(ids)
    }
}

impl MediaRepository for SqliteStore {
    fn list_photos(&self, property_id: &str) -> Result<Vec<PhotoRef>, StoreError> {
        let conn = self.lock()?;

        let exists = conn
            .query_row("SELECT 1 FROM properties WHERE id = ?", [property_id], |_| Ok(()))
            .optional()
            .map_err(query_failed)?
            .is_some();
        if !exists {
            return Err(StoreError::PropertyNotFound {
                property_id: property_id.to_string(),
            });
        }

        let mut stmt = conn
            .prepare(
                "SELECT id, url, thumbnail_url FROM media
                 WHERE property_id = ? AND kind = ?
                 ORDER BY position",
            )
            .map_err(query_failed)?;

        let photos = stmt
            .query_map(params![property_id, MediaKind::Photo.as_str()], |row| {
                Ok(PhotoRef {
                    photo_id: row.get(0)?,
                    url: row.get(1)?,
                    thumbnail_url: row.get(2)?,
                })
            })
            .map_err(query_failed)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_failed)?;

        Ok(photos)
    }
}

/// Raw candidate row before JSON columns are decoded
struct CandidateRow {
    candidate: Candidate,
    colors_json: String,
    listing_types_json: String,
    city: Option<String>,
    country: Option<String>,
}

impl FeatureStore for SqliteStore {
    fn has(&self, photo_id: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM image_features WHERE photo_id = ?",
                [photo_id],
                |_| Ok(()),
            )
            .optional()
            .map_err(query_failed)?;
        Ok(found.is_some())
    }

    fn insert(
        &self,
        photo_id: &str,
        property_id: &str,
        features: &ImageFeatures,
    ) -> Result<(), StoreError> {
        let colors = serde_json::to_string(&features.dominant_colors)
            .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO image_features
             (photo_id, property_id, p_hash, dominant_colors, aspect_ratio, brightness, indexed_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                photo_id,
                property_id,
                features.p_hash,
                colors,
                features.aspect_ratio,
                features.brightness,
                Utc::now().timestamp(),
            ],
        )
        .map_err(query_failed)?;

        Ok(())
    }

    fn query_candidates(&self, filter: &CandidateFilter) -> Result<Vec<Candidate>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT f.photo_id, f.property_id, f.p_hash, f.dominant_colors,
                        f.aspect_ratio, f.brightness, m.url, m.thumbnail_url,
                        p.listing_types, p.city, p.country
                 FROM image_features f
                 JOIN media m ON m.id = f.photo_id
                 JOIN properties p ON p.id = f.property_id
                 WHERE p.status = ?
                 ORDER BY f.photo_id",
            )
            .map_err(query_failed)?;

        let rows = stmt
            .query_map([PropertyStatus::Active.as_str()], |row| {
                Ok(CandidateRow {
                    candidate: Candidate {
                        photo_id: row.get(0)?,
                        property_id: row.get(1)?,
                        features: ImageFeatures {
                            p_hash: row.get(2)?,
                            dominant_colors: Vec::new(),
                            aspect_ratio: row.get(4)?,
                            brightness: row.get(5)?,
                        },
                        url: row.get(6)?,
                        thumbnail_url: row.get(7)?,
                    },
                    colors_json: row.get(3)?,
                    listing_types_json: row.get(8)?,
                    city: row.get(9)?,
                    country: row.get(10)?,
                })
            })
            .map_err(query_failed)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_failed)?;

        let mut candidates = Vec::with_capacity(rows.len());
        for row in rows {
            let listing_types: Vec<ListingType> = serde_json::from_str(&row.listing_types_json)
                .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;
            let property = PropertySummary {
                id: row.candidate.property_id.clone(),
                status: PropertyStatus::Active,
                listing_types,
                city: row.city,
                country: row.country,
            };
            if !property.matches(filter) {
                continue;
            }

            let mut candidate = row.candidate;
            candidate.features.dominant_colors = serde_json::from_str(&row.colors_json)
                .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;
            candidates.push(candidate);
        }

        Ok(candidates)
    }

    fn count_all(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT COUNT(*) FROM media WHERE kind = ?",
            [MediaKind::Photo.as_str()],
            |row| row.get::<_, i64>(0).map(|v| v as usize),
        )
        .map_err(query_failed)
    }

    fn count_indexed(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM image_features", [], |row| {
            row.get::<_, i64>(0).map(|v| v as usize)
        })
        .map_err(query_failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn catalog() -> Catalog {
        Catalog::from_json_str(
            r#"{"properties": [
                {"id": "p1", "listing_types": ["sale", "rent"], "city": "Porto", "country": "Portugal",
                 "photos": [
                    {"id": "p1-b", "url": "b.jpg"},
                    {"id": "p1-a", "url": "a.jpg", "thumbnail_url": "a_small.jpg"},
                    {"id": "p1-plan", "url": "plan.png", "kind": "floor_plan"}
                 ]},
                {"id": "p2", "status": "inactive", "photos": [{"id": "p2-a", "url": "c.jpg"}]}
            ]}"#,
        )
        .unwrap()
    }

    fn features() -> ImageFeatures {
        ImageFeatures {
            p_hash: "0123456789abcdef".to_string(),
            dominant_colors: vec!["#C00000".to_string(), "#404040".to_string()],
            aspect_ratio: 1.333,
            brightness: 87.5,
        }
    }

    #[test]
    fn sqlite_store_creates_database() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("features.db");

        let store = SqliteStore::open(&db_path).unwrap();

        assert!(db_path.exists());
        assert_eq!(store.count_indexed().unwrap(), 0);
    }

    #[test]
    fn import_then_list_photos_in_catalog_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.import_catalog(catalog()).unwrap(), (2, 4));

        let photos = store.list_photos("p1").unwrap();
        let ids: Vec<_> = photos.iter().map(|p| p.photo_id.as_str()).collect();
        assert_eq!(ids, vec!["p1-b", "p1-a"]);
        assert_eq!(photos[1].thumbnail_url.as_deref(), Some("a_small.jpg"));
        assert_eq!(store.property_ids().unwrap(), vec!["p1", "p2"]);
    }

    #[test]
    fn unknown_property_is_reported() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(matches!(
            store.list_photos("nope"),
            Err(StoreError::PropertyNotFound { .. })
        ));
    }

    #[test]
    fn features_round_trip_through_candidates() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.import_catalog(catalog()).unwrap();
        store.insert("p1-a", "p1", &features()).unwrap();
        store.insert("p2-a", "p2", &features()).unwrap();

        let candidates = store.query_candidates(&CandidateFilter::default()).unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].photo_id, "p1-a");
        assert_eq!(candidates[0].features, features());
        assert_eq!(candidates[0].url, "a.jpg");
    }

    #[test]
    fn insert_keeps_first_record() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.import_catalog(catalog()).unwrap();
        store.insert("p1-a", "p1", &features()).unwrap();

        let mut other = features();
        other.p_hash = "ffffffffffffffff".to_string();
        store.insert("p1-a", "p1", &other).unwrap();

        assert!(store.has("p1-a").unwrap());
        assert!(!store.has("p1-b").unwrap());
        let candidates = store.query_candidates(&CandidateFilter::default()).unwrap();
        assert_eq!(candidates[0].features.p_hash, "0123456789abcdef");
    }

    #[test]
    fn candidate_filter_applies_location_and_listing_type() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.import_catalog(catalog()).unwrap();
        store.insert("p1-a", "p1", &features()).unwrap();

        let porto = CandidateFilter {
            city: Some("port".to_string()),
            listing_types: Some(vec![ListingType::Rent]),
            ..Default::default()
        };
        let spain = CandidateFilter {
            country: Some("Spain".to_string()),
            ..Default::default()
        };

        assert_eq!(store.query_candidates(&porto).unwrap().len(), 1);
        assert!(store.query_candidates(&spain).unwrap().is_empty());
    }

    #[test]
    fn counts_only_photos() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.import_catalog(catalog()).unwrap();
        store.insert("p1-a", "p1", &features()).unwrap();

        assert_eq!(store.count_all().unwrap(), 3);
        assert_eq!(store.count_indexed().unwrap(), 1);
    }

    #[test]
    fn store_persists_across_opens() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("features.db");

        {
            let store = SqliteStore::open(&db_path).unwrap();
            store.import_catalog(catalog()).unwrap();
            store.insert("p1-a", "p1", &features()).unwrap();
        }

        let store = SqliteStore::open(&db_path).unwrap();
        assert!(store.has("p1-a").unwrap());
    }
}
