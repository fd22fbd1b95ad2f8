//! Search configuration.

/// Default minimum composite similarity for a result
pub const DEFAULT_MIN_SIMILARITY: f64 = 0.3;
/// Results returned when the filter does not ask for a limit
pub const DEFAULT_LIMIT: usize = 10;
/// Hard cap on the number of results
pub const MAX_LIMIT: usize = 20;
/// Largest accepted upload (10 MiB)
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Tunables of the search orchestrator
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub min_similarity: f64,
    pub default_limit: usize,
    pub max_limit: usize,
    pub max_upload_bytes: u64,
    /// Accepted upload media types, lowercase
    pub allowed_media_types: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_similarity: DEFAULT_MIN_SIMILARITY,
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
            max_upload_bytes: MAX_UPLOAD_BYTES,
            allowed_media_types: ["image/jpeg", "image/png", "image/webp", "image/gif"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_similarity(mut self, min_similarity: f64) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    pub fn default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn max_limit(mut self, limit: usize) -> Self {
        self.max_limit = limit;
        self
    }

    pub fn max_upload_bytes(mut self, bytes: u64) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Whether `media_type` is accepted, ignoring case and any `;` parameters
    pub fn accepts_media_type(&self, media_type: &str) -> bool {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        self.allowed_media_types.iter().any(|t| *t == essence)
    }
}
