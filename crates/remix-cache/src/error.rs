//! Error types for the composition cache
//!
//! Provides error handling for:
//! - Generator failures (propagated, never cached)
//! - Malformed requests (open keys)
//! - Re-entrant generation cycles and runaway nesting

use remix_model::{CompositionKey, ExtensionIdentifier};
use std::fmt;

/// What a generator was asked to produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationTarget {
    /// Composed base artifact
    Composition(CompositionKey),

    /// Specialized extension subtype
    Extension(ExtensionIdentifier),
}

impl fmt::Display for GenerationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Composition(key) => write!(f, "composition {key}"),
            Self::Extension(id) => write!(f, "extension {id}"),
        }
    }
}

/// Errors reported by a [`Generator`](crate::Generator)
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Code synthesis failed
    #[error("synthesis failed: {0}")]
    Synthesis(String),

    /// Generator cannot produce the requested shape
    #[error("unsupported composition: {0}")]
    Unsupported(String),

    /// Nested request back into the cache failed
    #[error("nested composition failed: {0}")]
    Nested(#[source] Box<CacheError>),
}

impl GenerationError {
    /// Create synthesis failure
    pub fn synthesis(message: impl Into<String>) -> Self {
        Self::Synthesis(message.into())
    }
}

impl From<CacheError> for GenerationError {
    fn from(err: CacheError) -> Self {
        Self::Nested(Box::new(err))
    }
}

/// Errors during cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Key still contains open generic parameters
    #[error("composition key is not closed: {key}")]
    OpenKey {
        /// Offending key
        key: CompositionKey,
    },

    /// Extension identifier names an open extension type
    #[error("extension identifier is not closed: {id}")]
    OpenExtension {
        /// Offending identifier
        id: ExtensionIdentifier,
    },

    /// Generator failed; nothing was cached
    #[error("generation of {target} failed: {source}")]
    Generation {
        /// Requested artifact
        target: GenerationTarget,
        /// Generator error
        #[source]
        source: GenerationError,
    },

    /// Generator re-entered the cache for a target it is already producing
    #[error("recursive generation of {target}")]
    RecursiveGeneration {
        /// Target already in flight
        target: GenerationTarget,
    },

    /// Nested generation went deeper than configured
    #[error("generation of {target} exceeds nesting depth {depth}")]
    GenerationDepthExceeded {
        /// Target that would exceed the limit
        target: GenerationTarget,
        /// Configured limit
        depth: usize,
    },

    /// Generator returned an artifact for a different target
    #[error("generator produced {produced} when asked for {requested}")]
    KeyMismatch {
        /// Requested target
        requested: GenerationTarget,
        /// Target of the returned artifact
        produced: GenerationTarget,
    },
}

impl CacheError {
    /// Check error originated in the generator itself
    #[inline]
    #[must_use]
    pub fn is_generation_failure(&self) -> bool {
        matches!(self, Self::Generation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remix_model::TypeRef;

    fn key() -> CompositionKey {
        CompositionKey::new("Base".into(), [TypeRef::named("ExtA")])
    }

    #[test]
    fn generation_error_display() {
        let err = CacheError::Generation {
            target: GenerationTarget::Composition(key()),
            source: GenerationError::synthesis("emitter crashed"),
        };
        assert_eq!(
            err.to_string(),
            "generation of composition Base with [ExtA] failed: synthesis failed: emitter crashed"
        );
        assert!(err.is_generation_failure());
    }

    #[test]
    fn nested_conversion() {
        let inner = CacheError::OpenKey { key: key() };
        let err: GenerationError = inner.into();
        assert!(matches!(err, GenerationError::Nested(_)));
    }

    #[test]
    fn extension_target_display() {
        let target = GenerationTarget::Extension(ExtensionIdentifier::new(key(), "ExtA".into()));
        assert_eq!(target.to_string(), "extension ExtA in (Base with [ExtA])");
    }
}
