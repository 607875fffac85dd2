//! Engine configuration.
//!
//! Everything has sensible defaults; a YAML file only needs the keys it
//! wants to change.

use crate::error::ConfigError;
use crate::facets::{default_dimensions, FacetDimension};
use crate::normalize::{ScoreNormalizer, DEFAULT_MAX_DISTANCE};
use crate::types::CollectionType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Default Values
// ============================================================================

/// Shared deadline for all collection calls of one request, in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 10000;

/// Candidates fetched per collection relative to its even share of the budget
pub const DEFAULT_OVERFETCH_FACTOR: usize = 2;

/// Tie-break order for equal scores, highest priority first
pub const DEFAULT_COLLECTION_PRIORITY: [CollectionType; 3] = [
    CollectionType::Entity,
    CollectionType::Document,
    CollectionType::Relationship,
];

// ============================================================================
// SearchConfig
// ============================================================================

/// Tunables for dispatch, ranking and faceting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Shared per-request deadline in milliseconds (default: 10000)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Overfetch multiplier for the even split (default: 2)
    #[serde(default = "default_overfetch_factor")]
    pub overfetch_factor: usize,

    /// Tie-break priority, highest first (default: entity, document, relationship)
    #[serde(default = "default_collection_priority")]
    pub collection_priority: Vec<CollectionType>,

    /// Per-collection maximum meaningful distance (default: 2.0)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub max_distance: BTreeMap<CollectionType, f64>,

    /// Metadata keys that produce facets
    #[serde(default = "default_dimensions")]
    pub facet_dimensions: Vec<FacetDimension>,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_overfetch_factor() -> usize {
    DEFAULT_OVERFETCH_FACTOR
}

fn default_collection_priority() -> Vec<CollectionType> {
    DEFAULT_COLLECTION_PRIORITY.to_vec()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            overfetch_factor: DEFAULT_OVERFETCH_FACTOR,
            collection_priority: default_collection_priority(),
            max_distance: BTreeMap::new(),
            facet_dimensions: default_dimensions(),
        }
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Builder method to set the shared deadline.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Builder method to set the overfetch factor.
    pub fn with_overfetch_factor(mut self, factor: usize) -> Self {
        self.overfetch_factor = factor;
        self
    }

    /// Builder method to set a collection's maximum distance.
    pub fn with_max_distance(mut self, collection: CollectionType, max_distance: f64) -> Self {
        self.max_distance.insert(collection, max_distance);
        self
    }

    /// Get the normalizer configured for a collection.
    pub fn normalizer_for(&self, collection: CollectionType) -> Result<ScoreNormalizer, ConfigError> {
        let max_distance = self
            .max_distance
            .get(&collection)
            .copied()
            .unwrap_or(DEFAULT_MAX_DISTANCE);
        ScoreNormalizer::new(max_distance)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout_ms must be positive".to_string()));
        }
        if self.overfetch_factor == 0 {
            return Err(ConfigError::Invalid(
                "overfetch_factor must be at least 1".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for collection in &self.collection_priority {
            if !seen.insert(*collection) {
                return Err(ConfigError::Invalid(format!(
                    "collection '{}' listed twice in collection_priority",
                    collection
                )));
            }
        }

        for collection in self.max_distance.keys() {
            self.normalizer_for(*collection)?;
        }

        let mut facets = HashSet::new();
        for dimension in &self.facet_dimensions {
            if dimension.facet == crate::facets::BY_TYPE {
                return Err(ConfigError::Invalid(format!(
                    "facet name '{}' is reserved",
                    dimension.facet
                )));
            }
            if !facets.insert(dimension.facet.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "facet '{}' defined twice",
                    dimension.facet
                )));
            }
        }

        Ok(())
    }
}

// ============================================================================
// ConfigStore
// ============================================================================

/// Location of the engine configuration file.
///
/// Stored in YAML format at `~/.config/polysearch/config.yaml`.
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Create a new config store at the default location.
    pub fn new_default() -> Self {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|p| p.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        let path = base.join("polysearch").join("config.yaml");
        Self { path }
    }

    /// Create a config store at a custom path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Load the configuration. A missing file yields the defaults.
    pub fn load(&self) -> Result<SearchConfig, ConfigError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No config file, using defaults");
                return Ok(SearchConfig::default());
            }
            Err(e) => return Err(ConfigError::Io(e.to_string())),
        };

        if content.trim().is_empty() {
            return Ok(SearchConfig::default());
        }

        let config: SearchConfig =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &SearchConfig) -> Result<(), ConfigError> {
        config.validate()?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }

        let content =
            serde_yaml::to_string(config).map_err(|e| ConfigError::Parse(e.to_string()))?;

        std::fs::write(&self.path, content).map_err(|e| ConfigError::Io(e.to_string()))?;

        Ok(())
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new_default()
    }
}

// ============================================================================
// Tests
// ============================================================================
