//! # Scoring Module
//!
//! Compares two `ImageFeatures` values.
//!
//! ## Composite Score
//! | Dimension      | Source                   | Weight |
//! |----------------|--------------------------|--------|
//! | structural     | pHash similarity         | 0.60   |
//! | color palette  | dominant color matching  | 0.25   |
//! | composition    | aspect ratio similarity  | 0.15   |

mod explanation;

pub use explanation::{explain, FALLBACK_EXPLANATION};

use crate::core::features::{ColorPaletteExtractor, GeometryAnalyzer, ImageFeatures, PerceptualHasher};
use crate::core::precision::round3;
use serde::{Deserialize, Serialize};

pub const STRUCTURAL_WEIGHT: f64 = 0.6;
pub const COLOR_PALETTE_WEIGHT: f64 = 0.25;
pub const COMPOSITION_WEIGHT: f64 = 0.15;

/// Per-dimension similarity scores, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub structural: f64,
    pub color_palette: f64,
    pub composition: f64,
}

impl ScoreBreakdown {
    /// Weighted composite of the three dimensions
    pub fn similarity(&self) -> f64 {
        STRUCTURAL_WEIGHT * self.structural
            + COLOR_PALETTE_WEIGHT * self.color_palette
            + COMPOSITION_WEIGHT * self.composition
    }

    /// Every dimension rounded to 3 decimals
    pub fn rounded(&self) -> Self {
        Self {
            structural: round3(self.structural),
            color_palette: round3(self.color_palette),
            composition: round3(self.composition),
        }
    }

    /// Human-readable explanation of these scores
    pub fn explanation(&self) -> String {
        explain(self.structural, self.color_palette, self.composition)
    }
}

/// A scored pair of images, ready to display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Composite similarity, 3 decimals
    pub similarity: f64,
    /// Sub-scores, 3 decimals each
    pub breakdown: ScoreBreakdown,
    pub explanation: String,
}

/// Scores a query against candidates
pub struct SimilarityScorer;

impl SimilarityScorer {
    /// Raw (unrounded) sub-scores of `query` against `candidate`.
    ///
    /// The color dimension averages over the query's palette.
    pub fn score(query: &ImageFeatures, candidate: &ImageFeatures) -> ScoreBreakdown {
        ScoreBreakdown {
            structural: PerceptualHasher::similarity(&query.p_hash, &candidate.p_hash),
            color_palette: ColorPaletteExtractor::color_similarity(
                &query.dominant_colors,
                &candidate.dominant_colors,
            ),
            composition: GeometryAnalyzer::aspect_ratio_similarity(
                query.aspect_ratio,
                candidate.aspect_ratio,
            ),
        }
    }

    /// Score and round a pair for display
    pub fn compare(query: &ImageFeatures, candidate: &ImageFeatures) -> Comparison {
        let breakdown = Self::score(query, candidate);
        Comparison {
            similarity: round3(breakdown.similarity()),
            breakdown: breakdown.rounded(),
            explanation: breakdown.explanation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(p_hash: &str, colors: &[&str], aspect_ratio: f64) -> ImageFeatures {
        ImageFeatures {
            p_hash: p_hash.to_string(),
            dominant_colors: colors.iter().map(|c| c.to_string()).collect(),
            aspect_ratio,
            brightness: 128.0,
        }
    }

    #[test]
    fn weights_sum_to_one() {
        let total = STRUCTURAL_WEIGHT + COLOR_PALETTE_WEIGHT + COMPOSITION_WEIGHT;
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn identical_features_score_one() {
        let a = features("a1b2c3d4e5f60718", &["#C00000", "#404040"], 1.5);
        let comparison = SimilarityScorer::compare(&a, &a);

        assert_eq!(comparison.similarity, 1.0);
        assert_eq!(
            comparison.breakdown,
            ScoreBreakdown {
                structural: 1.0,
                color_palette: 1.0,
                composition: 1.0
            }
        );
        assert!(comparison.explanation.contains("same perspective"));
    }

    #[test]
    fn composite_uses_weights() {
        let breakdown = ScoreBreakdown {
            structural: 0.5,
            color_palette: 1.0,
            composition: 0.0,
        };
        assert!((breakdown.similarity() - 0.55).abs() < 1e-12);
    }

    #[test]
    fn score_combines_dimensions() {
        let query = features("0000000000000000", &["#000000"], 1.0);
        let candidate = features("ffffffffffffffff", &["#000000"], 2.0);
        let breakdown = SimilarityScorer::score(&query, &candidate);

        assert_eq!(breakdown.structural, 0.0);
        assert_eq!(breakdown.color_palette, 1.0);
        assert_eq!(breakdown.composition, 0.5);
    }

    #[test]
    fn compare_rounds_to_three_decimals() {
        let query = features("0000000000000000", &["#000000"], 1.0);
        let candidate = features("7000000000000000", &["#000000"], 3.0);
        let comparison = SimilarityScorer::compare(&query, &candidate);

        // structural 61/64, composition 1/3
        assert_eq!(comparison.breakdown.structural, 0.953);
        assert_eq!(comparison.breakdown.composition, 0.333);
        assert_eq!(comparison.similarity, 0.872);
    }
}
