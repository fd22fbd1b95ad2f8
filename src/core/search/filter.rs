//! Client-supplied search filter.

use super::{SearchConfig, MAX_LIMIT};
use crate::core::store::{CandidateFilter, ListingType};
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Optional constraints on a search, as sent by a client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchFilter {
    /// Drop results below this composite similarity (0..=1)
    pub min_similarity: Option<f64>,
    /// Maximum number of results, capped by the configuration
    pub limit: Option<usize>,
    pub listing_types: Option<Vec<ListingType>>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// Threshold and limit after defaults and caps are applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedLimits {
    pub min_similarity: f64,
    pub limit: usize,
}

impl SearchFilter {
    /// Parse a JSON filter, rejecting unknown fields and wrong types
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        let filter: Self =
            serde_json::from_str(json).map_err(|e| ValidationError::MalformedFilter(e.to_string()))?;
        filter.validate()?;
        Ok(filter)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(value) = self.min_similarity {
            if !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::InvalidMinSimilarity { value });
            }
        }
        if let Some(0) = self.limit {
            return Err(ValidationError::InvalidLimit { value: 0 });
        }
        Ok(())
    }

    /// Apply defaults and the limit cap from `config`
    pub fn resolve(&self, config: &SearchConfig) -> Result<ResolvedLimits, ValidationError> {
        self.validate()?;
        Ok(ResolvedLimits {
            min_similarity: self.min_similarity.unwrap_or(config.min_similarity),
            limit: self
                .limit
                .unwrap_or(config.default_limit)
                .min(config.max_limit)
                .min(MAX_LIMIT),
        })
    }

    /// The property predicate handed to the feature store
    pub fn candidate_filter(&self) -> CandidateFilter {
        CandidateFilter {
            listing_types: self.listing_types.clone(),
            city: self.city.clone(),
            country: self.country.clone(),
        }
    }
}
