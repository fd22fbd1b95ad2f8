//! Perceptual Hash (pHash) implementation.
//!
//! pHash works by:
//! 1. Stretching the image to 32x32 and converting to grayscale
//! 2. Averaging each 4x4 block, giving an 8x8 grid of low-frequency means
//! 3. Taking the median of every block except the first (the DC block)
//! 4. For each block: if brighter than the median, set bit to 1, else 0
//! 5. Packing the 64 bits into 16 lowercase hex characters
//!
//! The block averaging stands in for a real DCT. Stored fingerprints are
//! compared bit-for-bit with freshly computed ones, so the steps above must
//! not drift.

use crate::core::imaging::DecodedImage;
use crate::error::ImageProcessingError;

/// Side of the grayscale grid the image is stretched to
const SAMPLE_SIZE: u32 = 32;
/// Side of the block grid (8x8 blocks = 64 bits)
const GRID_SIZE: u32 = 8;
/// Side of a single block in pixels
const BLOCK_SIZE: u32 = SAMPLE_SIZE / GRID_SIZE;

/// Number of hex characters in a fingerprint
pub const HASH_HEX_LEN: usize = 16;
/// Number of bits in a fingerprint
pub const HASH_BITS: u32 = 64;

/// Structural fingerprinting of images
pub struct PerceptualHasher;

impl PerceptualHasher {
    /// Compute the 16-character hex fingerprint of an image
    pub fn hash(image: &DecodedImage) -> Result<String, ImageProcessingError> {
        let gray = image.grayscale(SAMPLE_SIZE, SAMPLE_SIZE)?;
        let means = block_means(&gray);

        let mut ac_means: Vec<f64> = means[1..].to_vec();
        ac_means.sort_by(f64::total_cmp);
        let median = ac_means[ac_means.len() / 2];

        let hash = means
            .chunks(4)
            .map(|nibble| {
                let value = nibble
                    .iter()
                    .fold(0u32, |acc, &mean| (acc << 1) | u32::from(mean > median));
                // A nibble is always < 16, so this is a valid hex digit
                std::char::from_digit(value, 16).unwrap_or('0')
            })
            .collect();

        Ok(hash)
    }

    /// Similarity of two fingerprints: `1 - hamming_distance / 64`.
    ///
    /// Fingerprints of different lengths (or containing non-hex characters)
    /// have similarity 0. Two empty strings differ in no bit, so they score 1.
    /// Longer-than-standard inputs floor at 0.
    pub fn similarity(hash_a: &str, hash_b: &str) -> f64 {
        if hash_a.len() != hash_b.len() {
            return 0.0;
        }

        let mut distance = 0u32;
        for (a, b) in hash_a.chars().zip(hash_b.chars()) {
            match (a.to_digit(16), b.to_digit(16)) {
                (Some(a), Some(b)) => distance += (a ^ b).count_ones(),
                _ => return 0.0,
            }
        }

        (1.0 - f64::from(distance) / f64::from(HASH_BITS)).max(0.0)
    }
}

/// Row-major means of the 4x4 blocks of a 32x32 grayscale grid
fn block_means(gray: &image::GrayImage) -> Vec<f64> {
    let pixels_per_block = f64::from(BLOCK_SIZE * BLOCK_SIZE);
    let mut means = Vec::with_capacity((GRID_SIZE * GRID_SIZE) as usize);

    for block_y in 0..GRID_SIZE {
        for block_x in 0..GRID_SIZE {
            let mut sum = 0u32;
            for y in 0..BLOCK_SIZE {
                for x in 0..BLOCK_SIZE {
                    let pixel = gray.get_pixel(block_x * BLOCK_SIZE + x, block_y * BLOCK_SIZE + y);
                    sum += u32::from(pixel[0]);
                }
            }
            means.push(f64::from(sum) / pixels_per_block);
        }
    }

    means
}
