//! Filesystem-backed byte fetcher.

use super::ByteFetcher;
use crate::error::FetchError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Reads photos from local paths and `file://` URLs.
///
/// Relative paths resolve against the base directory when one is set.
/// Other URL schemes are rejected with `FetchError::UnsupportedUrl`.
#[derive(Debug, Clone, Default)]
pub struct FileFetcher {
    base_dir: Option<PathBuf>,
}

impl FileFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative photo paths against `base_dir`
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn resolve(&self, url: &str) -> Result<PathBuf, FetchError> {
        let raw = match url.strip_prefix("file://") {
            Some(path) => path,
            None if url.contains("://") => {
                return Err(FetchError::UnsupportedUrl {
                    url: url.to_string(),
                })
            }
            None => url,
        };

        let path = Path::new(raw);
        Ok(match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        })
    }
}

impl ByteFetcher for FileFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let path = self.resolve(url)?;
        std::fs::read(&path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => FetchError::NotFound {
                url: url.to_string(),
            },
            _ => FetchError::Io {
                url: url.to_string(),
                source,
            },
        })
    }
}
