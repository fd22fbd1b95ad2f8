//! Dominant color palette extraction.
//!
//! Each channel is quantized into 4 buckets (`floor(c / 64) * 64`), giving
//! 64 possible colors. The 5 most frequent quantized colors, most frequent
//! first, form the palette. Equal counts keep the order in which the colors
//! were first seen in a row-major scan.

use crate::core::imaging::DecodedImage;
use crate::error::ImageProcessingError;

/// Side of the RGB grid the image is stretched to
const SAMPLE_SIZE: u32 = 100;
/// Width of one quantization bucket per channel
const BUCKET_WIDTH: u8 = 64;
/// Buckets per channel
const BUCKETS: usize = 4;
/// Maximum number of palette entries
pub const MAX_PALETTE_SIZE: usize = 5;

/// Largest possible RGB distance, between black and white
fn max_color_distance() -> f64 {
    (3.0 * 255.0f64.powi(2)).sqrt()
}

#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    count: u32,
    first_seen: usize,
}

/// Dominant color extraction and palette comparison
pub struct ColorPaletteExtractor;

impl ColorPaletteExtractor {
    /// The image's dominant colors as `#RRGGBB` strings, at most 5
    pub fn dominant_colors(image: &DecodedImage) -> Result<Vec<String>, ImageProcessingError> {
        let rgb = image.rgb(SAMPLE_SIZE, SAMPLE_SIZE)?;

        let mut buckets = [Bucket::default(); BUCKETS * BUCKETS * BUCKETS];
        for (position, pixel) in rgb.pixels().enumerate() {
            let [r, g, b] = pixel.0.map(|c| (c / BUCKET_WIDTH) as usize);
            let bucket = &mut buckets[(r * BUCKETS + g) * BUCKETS + b];
            if bucket.count == 0 {
                bucket.first_seen = position;
            }
            bucket.count += 1;
        }

        let mut ranked: Vec<(usize, Bucket)> = buckets
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, bucket)| bucket.count > 0)
            .collect();
        ranked.sort_by(|(_, a), (_, b)| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.first_seen.cmp(&b.first_seen))
        });

        Ok(ranked
            .into_iter()
            .take(MAX_PALETTE_SIZE)
            .map(|(index, _)| {
                let quantize = |bucket: usize| (bucket as u8) * BUCKET_WIDTH;
                let r = quantize(index / (BUCKETS * BUCKETS));
                let g = quantize((index / BUCKETS) % BUCKETS);
                let b = quantize(index % BUCKETS);
                format!("#{:02X}{:02X}{:02X}", r, g, b)
            })
            .collect())
    }

    /// Average, over the colors of `palette_a`, of the best match in `palette_b`.
    ///
    /// Not symmetric when the palettes differ in length: the average is taken
    /// over the first palette only. Returns 0 if either palette is empty.
    pub fn color_similarity(palette_a: &[String], palette_b: &[String]) -> f64 {
        if palette_a.is_empty() || palette_b.is_empty() {
            return 0.0;
        }

        let targets: Vec<[u8; 3]> = palette_b.iter().filter_map(|c| parse_hex_color(c)).collect();

        let total: f64 = palette_a
            .iter()
            .map(|color| match parse_hex_color(color) {
                Some(source) => targets
                    .iter()
                    .map(|target| Self::pair_similarity(source, *target))
                    .fold(0.0, f64::max),
                None => 0.0,
            })
            .sum();

        total / palette_a.len() as f64
    }

    /// `1 - euclidean_distance / max_distance` in RGB space
    pub fn pair_similarity(a: [u8; 3], b: [u8; 3]) -> f64 {
        let distance = a
            .iter()
            .zip(b.iter())
            .map(|(&x, &y)| (f64::from(x) - f64::from(y)).powi(2))
            .sum::<f64>()
            .sqrt();

        1.0 - distance / max_color_distance()
    }
}

/// Parse `#RRGGBB` (leading `#` optional) into an RGB triple
pub fn parse_hex_color(color: &str) -> Option<[u8; 3]> {
    let hex = color.strip_prefix('#').unwrap_or(color);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some([channel(0..2)?, channel(2..4)?, channel(4..6)?])
}
