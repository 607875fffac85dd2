//! Distance to relevance conversion.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Maximum meaningful L2 distance between normalized embeddings.
pub const DEFAULT_MAX_DISTANCE: f64 = 2.0;

/// Converts an adapter's raw distance into a [0, 1] score.
///
/// `score = max(0, 1 - distance / max_distance)`. Higher is better, and scores
/// from collections with different metrics become comparable as long as each
/// adapter carries the `max_distance` of its own metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreNormalizer {
    max_distance: f64,
}

impl ScoreNormalizer {
    pub fn new(max_distance: f64) -> Result<Self, ConfigError> {
        if !max_distance.is_finite() || max_distance <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "max distance must be positive and finite, got {}",
                max_distance
            )));
        }
        Ok(Self { max_distance })
    }

    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    pub fn normalize(&self, distance: f64) -> f64 {
        if distance.is_nan() {
            return 0.0;
        }
        (1.0 - distance / self.max_distance).clamp(0.0, 1.0)
    }
}

impl Default for ScoreNormalizer {
    fn default() -> Self {
        Self {
            max_distance: DEFAULT_MAX_DISTANCE,
        }
    }
}
