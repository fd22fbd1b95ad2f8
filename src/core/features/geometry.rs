//! Aspect ratio and brightness.

use crate::core::imaging::DecodedImage;
use crate::core::precision::{round1, round3};
use crate::error::ImageProcessingError;

/// Side of the grayscale grid used for brightness
const BRIGHTNESS_SAMPLE_SIZE: u32 = 50;

/// Simple geometric and tonal measurements
pub struct GeometryAnalyzer;

impl GeometryAnalyzer {
    /// `width / height`, rounded to 3 decimals. 0 when height is 0.
    pub fn aspect_ratio(width: u32, height: u32) -> f64 {
        if height == 0 {
            return 0.0;
        }
        round3(f64::from(width) / f64::from(height))
    }

    /// Mean grayscale intensity (0-255), rounded to 1 decimal
    pub fn brightness(image: &DecodedImage) -> Result<f64, ImageProcessingError> {
        let gray = image.grayscale(BRIGHTNESS_SAMPLE_SIZE, BRIGHTNESS_SAMPLE_SIZE)?;

        let total: u64 = gray.pixels().map(|p| u64::from(p[0])).sum();
        let count = u64::from(BRIGHTNESS_SAMPLE_SIZE * BRIGHTNESS_SAMPLE_SIZE);

        Ok(round1(total as f64 / count as f64))
    }

    /// `min / max` of two aspect ratios.
    ///
    /// Two zero ratios are identical (1.0); a single zero ratio matches nothing (0.0).
    pub fn aspect_ratio_similarity(a: f64, b: f64) -> f64 {
        match (a == 0.0, b == 0.0) {
            (true, true) => 1.0,
            (true, false) | (false, true) => 0.0,
            (false, false) => a.min(b) / a.max(b),
        }
    }
}
