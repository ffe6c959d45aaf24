//! Generator seam
//!
//! The generator performs the actual code synthesis. The cache treats it as a
//! black box: a pure function of its input that may be slow and may call back
//! into the cache for nested compositions.

use crate::cache::CompositionCache;
use crate::error::GenerationError;
use remix_model::{Artifact, CompositionKey, ExtensionArtifact, ExtensionIdentifier};

/// Output of one base-composition synthesis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedComposition {
    /// The composed artifact
    pub artifact: Artifact,
    /// Specialized extension subtypes synthesized alongside it
    pub extension_artifacts: Vec<ExtensionArtifact>,
}

impl GeneratedComposition {
    /// Composition without specialized extensions
    #[inline]
    #[must_use]
    pub fn new(artifact: Artifact) -> Self {
        Self {
            artifact,
            extension_artifacts: Vec::new(),
        }
    }

    /// Add specialized extension subtype
    #[inline]
    #[must_use]
    pub fn with_extension_artifact(mut self, extension: ExtensionArtifact) -> Self {
        self.extension_artifacts.push(extension);
        self
    }
}

/// Synthesizes composed artifacts
///
/// # Contract
/// - Same input must yield a behaviorally equivalent artifact
/// - The returned artifact's key (or identifier) must equal the request
/// - May re-enter `cache` on the calling thread for nested compositions
#[cfg_attr(test, mockall::automock)]
pub trait Generator: Send + Sync {
    /// Synthesize the artifact for `key`
    ///
    /// # Errors
    /// Returns [`GenerationError`] if synthesis fails
    fn generate(
        &self,
        key: &CompositionKey,
        cache: &CompositionCache,
    ) -> Result<GeneratedComposition, GenerationError>;

    /// Synthesize the specialized subtype for `id`
    ///
    /// # Errors
    /// Returns [`GenerationError`] if synthesis fails
    fn generate_extension(
        &self,
        id: &ExtensionIdentifier,
        cache: &CompositionCache,
    ) -> Result<ExtensionArtifact, GenerationError>;
}
