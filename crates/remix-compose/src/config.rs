//! Aggregate configuration
//!
//! Loads cache, import and composer settings from one TOML document:
//!
//! ```toml
//! [cache]
//! max_generation_depth = 16
//!
//! [import]
//! malformed = "warn"
//!
//! [composer]
//! max_nesting_depth = 4
//! ```

use crate::composer::ComposerConfig;
use remix_cache::{
    ArtifactMetadataImporter, CacheConfig, CompositionCache, Generator, ImportConfig,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML could not be parsed into a configuration
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// All remix settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemixConfig {
    /// Composition cache settings
    pub cache: CacheConfig,
    /// Metadata import settings
    pub import: ImportConfig,
    /// Composer settings
    pub composer: ComposerConfig,
}

impl RemixConfig {
    /// Parse configuration from TOML; missing sections take their defaults
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] on malformed TOML or unknown values
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Build cache with these settings
    #[must_use]
    pub fn build_cache(&self, generator: Arc<dyn Generator>) -> CompositionCache {
        CompositionCache::with_config(generator, self.cache)
    }

    /// Build importer with these settings
    #[inline]
    #[must_use]
    pub fn importer(&self) -> ArtifactMetadataImporter {
        ArtifactMetadataImporter::with_config(self.import)
    }
}
