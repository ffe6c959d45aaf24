//! Remix Composition Cache
//!
//! Memoizing synthesis of composed mixin artifacts.
//!
//! # Core Concepts
//!
//! - [`CompositionCache`]: One artifact per key, generated at most once
//! - [`Generator`]: Black-box synthesis collaborator
//! - [`ArtifactDescriptorDecoder`]: Recovers metadata from synthesized artifacts
//! - [`ArtifactMetadataImporter`]: Pre-populates a cache from a prior run
//! - [`JsonDescriptorCodec`]: Reference descriptor encoding
//!
//! # Example
//!
//! ```rust,ignore
//! use remix_cache::{ArtifactMetadataImporter, CompositionCache, JsonDescriptorCodec};
//!
//! let cache = CompositionCache::new(generator);
//! ArtifactMetadataImporter::new().import(previous_run, &JsonDescriptorCodec::new(), &cache);
//!
//! let artifact = cache.get_or_create(&key)?;
//! ```

#![warn(unreachable_pub)]

mod cache;
mod config;
mod descriptor;
mod error;
mod generator;
mod importer;

pub use cache::{CacheStats, CompositionCache};
pub use config::{CacheConfig, ImportConfig, MalformedDescriptorPolicy};
pub use descriptor::{ArtifactDescriptorDecoder, DescriptorOutcome, JsonDescriptorCodec};
pub use error::{CacheError, GenerationError, GenerationTarget};
pub use generator::{GeneratedComposition, Generator};
pub use importer::{ArtifactMetadataImporter, ImportReport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
