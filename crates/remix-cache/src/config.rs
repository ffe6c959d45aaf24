//! Cache and import configuration

use serde::{Deserialize, Serialize};

/// Composition cache settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum generations nested inside another; `0` forbids re-entry
    pub max_generation_depth: usize,
}

impl CacheConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With maximum generation depth
    #[inline]
    #[must_use]
    pub fn with_max_generation_depth(mut self, depth: usize) -> Self {
        self.max_generation_depth = depth;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_generation_depth: 32,
        }
    }
}

/// Handling of descriptors that are present but cannot be decoded
///
/// Handles without any descriptor are always skipped silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedDescriptorPolicy {
    /// Skip without logging
    #[default]
    Skip,

    /// Skip and emit a warning
    Warn,
}

/// Metadata import settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// What to do with malformed descriptors
    pub malformed: MalformedDescriptorPolicy,
}

impl ImportConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With malformed descriptor policy
    #[inline]
    #[must_use]
    pub fn with_malformed_policy(mut self, policy: MalformedDescriptorPolicy) -> Self {
        self.malformed = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        assert_eq!(CacheConfig::default().max_generation_depth, 32);
        assert_eq!(ImportConfig::default().malformed, MalformedDescriptorPolicy::Skip);
    }

    #[test]
    fn builders() {
        let cache = CacheConfig::new().with_max_generation_depth(4);
        assert_eq!(cache.max_generation_depth, 4);

        let import = ImportConfig::new().with_malformed_policy(MalformedDescriptorPolicy::Warn);
        assert_eq!(import.malformed, MalformedDescriptorPolicy::Warn);
    }

    #[test]
    fn policy_deserializes_snake_case() {
        let config: ImportConfig = serde_json::from_str(r#"{"malformed":"warn"}"#).unwrap();
        assert_eq!(config.malformed, MalformedDescriptorPolicy::Warn);
    }
}
