//! # Features Module
//!
//! Turns raw image bytes into an `ImageFeatures` fingerprint.
//!
//! ## Extractors
//! - **PerceptualHasher** - 64-bit structural fingerprint (block-mean pHash)
//! - **ColorPaletteExtractor** - up to 5 quantized dominant colors
//! - **GeometryAnalyzer** - aspect ratio and mean brightness
//!
//! ## Example
//! ```rust,ignore
//! use property_visual_search::core::features::FeatureExtractor;
//!
//! let features = FeatureExtractor::extract(&bytes)?;
//! println!("{} {:?}", features.p_hash, features.dominant_colors);
//! ```

mod geometry;
mod palette;
mod phash;

pub use geometry::GeometryAnalyzer;
pub use palette::{parse_hex_color, ColorPaletteExtractor, MAX_PALETTE_SIZE};
pub use phash::{PerceptualHasher, HASH_BITS, HASH_HEX_LEN};

use crate::core::imaging::DecodedImage;
use crate::error::ImageProcessingError;
use serde::{Deserialize, Serialize};

/// Visual fingerprint of one image.
///
/// Immutable once computed: stored records are compared against fresh
/// query features without ever being recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageFeatures {
    /// 16 lowercase hex characters (64 bits)
    pub p_hash: String,
    /// 1-5 `#RRGGBB` colors, most frequent first
    pub dominant_colors: Vec<String>,
    /// width / height, 3 decimals
    pub aspect_ratio: f64,
    /// Mean grayscale intensity 0-255, 1 decimal
    pub brightness: f64,
}

/// Composes the hasher, palette extractor and geometry analyzer
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Decode `bytes` and compute every feature.
    ///
    /// Fails if the bytes are empty, corrupt, or not a supported raster format.
    pub fn extract(bytes: &[u8]) -> Result<ImageFeatures, ImageProcessingError> {
        let image = DecodedImage::decode(bytes)?;
        Self::extract_image(&image)
    }

    /// Compute every feature of an already-decoded image
    pub fn extract_image(image: &DecodedImage) -> Result<ImageFeatures, ImageProcessingError> {
        Ok(ImageFeatures {
            p_hash: PerceptualHasher::hash(image)?,
            dominant_colors: ColorPaletteExtractor::dominant_colors(image)?,
            aspect_ratio: GeometryAnalyzer::aspect_ratio(image.width(), image.height()),
            brightness: GeometryAnalyzer::brightness(image)?,
        })
    }
}
