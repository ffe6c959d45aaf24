//! Memoizing composition cache
//!
//! Maps a [`CompositionKey`] to the one [`Artifact`] synthesized for it, and an
//! [`ExtensionIdentifier`] to the one specialized [`ExtensionArtifact`].
//!
//! Every operation, hits included, runs under a single re-entrant mutex owned
//! by the cache instance. Mutations are totally ordered, so each key is
//! generated at most once. The generator may call back into the same cache
//! for nested compositions on the calling thread.

use crate::config::CacheConfig;
use crate::error::{CacheError, GenerationError, GenerationTarget};
use crate::generator::{GeneratedComposition, Generator};
use parking_lot::ReentrantMutex;
use remix_model::{Artifact, CompositionKey, ExtensionArtifact, ExtensionIdentifier};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Counters for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that had to invoke the generator
    pub misses: u64,
    /// Successful generator runs
    pub generations: u64,
    /// Failed generator runs
    pub generation_failures: u64,
    /// Entries inserted by `populate*`
    pub populated: u64,
    /// `populate*` calls ignored because an entry already existed
    pub populate_conflicts: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    artifacts: HashMap<CompositionKey, Arc<Artifact>>,
    extension_artifacts: HashMap<ExtensionIdentifier, Arc<ExtensionArtifact>>,
    in_flight: Vec<GenerationTarget>,
    stats: CacheStats,
}

/// Pops the in-flight marker even if the generator panics
struct InFlight<'a> {
    state: &'a RefCell<CacheState>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.in_flight.pop();
        }
    }
}

/// Composition cache
///
/// # Invariants
/// - At most one artifact per key for the lifetime of the cache
/// - Inserts are first-writer-wins; nothing is ever overwritten
/// - A failed generation leaves no entry behind
pub struct CompositionCache {
    generator: Arc<dyn Generator>,
    config: CacheConfig,
    state: ReentrantMutex<RefCell<CacheState>>,
}

impl CompositionCache {
    /// Create cache backed by `generator`
    #[inline]
    #[must_use]
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self::with_config(generator, CacheConfig::default())
    }

    /// Create cache with explicit configuration
    #[must_use]
    pub fn with_config(generator: Arc<dyn Generator>, config: CacheConfig) -> Self {
        Self {
            generator,
            config,
            state: ReentrantMutex::new(RefCell::new(CacheState::default())),
        }
    }

    /// Cache configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get cached artifact for `key`, generating it on first request
    ///
    /// Repeated calls for the same key return the same `Arc`.
    ///
    /// # Errors
    /// - [`CacheError::OpenKey`] if `key` has open generic parameters
    /// - [`CacheError::Generation`] if the generator fails (retried on next call)
    /// - [`CacheError::RecursiveGeneration`] / [`CacheError::GenerationDepthExceeded`]
    ///   for runaway re-entrant generation
    /// - [`CacheError::KeyMismatch`] if the generator answers for another key
    pub fn get_or_create(&self, key: &CompositionKey) -> Result<Arc<Artifact>, CacheError> {
        if !key.is_closed() {
            return Err(CacheError::OpenKey { key: key.clone() });
        }

        let guard = self.state.lock();
        if let Some(existing) = Self::lookup(&guard, |state| state.artifacts.get(key).cloned()) {
            tracing::trace!(%key, "composition cache hit");
            return Ok(existing);
        }

        let target = GenerationTarget::Composition(key.clone());
        let generated = self.run_generator(&guard, &target, || self.generator.generate(key, self))?;

        let mut state = guard.borrow_mut();
        if generated.artifact.key() != key {
            state.stats.generation_failures += 1;
            return Err(CacheError::KeyMismatch {
                requested: target,
                produced: GenerationTarget::Composition(generated.artifact.key().clone()),
            });
        }

        let GeneratedComposition {
            artifact,
            extension_artifacts,
        } = generated;
        for extension in extension_artifacts {
            state
                .extension_artifacts
                .entry(extension.identifier().clone())
                .or_insert_with(|| Arc::new(extension));
        }

        state.stats.generations += 1;
        let stored = Arc::clone(
            state
                .artifacts
                .entry(key.clone())
                .or_insert_with(|| Arc::new(artifact)),
        );
        tracing::debug!(
            %key,
            produced = %stored.produced().produced_type(),
            "composed artifact generated"
        );
        Ok(stored)
    }

    /// Get cached specialized extension subtype, never generating
    ///
    /// `None` means "not generated yet", not a fault.
    #[must_use]
    pub fn get_sub_artifact(&self, id: &ExtensionIdentifier) -> Option<Arc<ExtensionArtifact>> {
        let guard = self.state.lock();
        let state = guard.borrow();
        state.extension_artifacts.get(id).cloned()
    }

    /// Get cached specialized extension subtype, generating it on first request
    ///
    /// # Errors
    /// Same as [`CompositionCache::get_or_create`], plus
    /// [`CacheError::OpenExtension`] if only the extension type is open
    pub fn get_or_create_sub_artifact(
        &self,
        id: &ExtensionIdentifier,
    ) -> Result<Arc<ExtensionArtifact>, CacheError> {
        if !id.owner().is_closed() {
            return Err(CacheError::OpenKey {
                key: id.owner().clone(),
            });
        }
        if !id.extension().is_closed() {
            return Err(CacheError::OpenExtension { id: id.clone() });
        }

        let guard = self.state.lock();
        if let Some(existing) =
            Self::lookup(&guard, |state| state.extension_artifacts.get(id).cloned())
        {
            tracing::trace!(%id, "extension cache hit");
            return Ok(existing);
        }

        let target = GenerationTarget::Extension(id.clone());
        let extension =
            self.run_generator(&guard, &target, || self.generator.generate_extension(id, self))?;

        let mut state = guard.borrow_mut();
        if extension.identifier() != id {
            state.stats.generation_failures += 1;
            return Err(CacheError::KeyMismatch {
                requested: target,
                produced: GenerationTarget::Extension(extension.identifier().clone()),
            });
        }

        state.stats.generations += 1;
        let stored = Arc::clone(
            state
                .extension_artifacts
                .entry(id.clone())
                .or_insert_with(|| Arc::new(extension)),
        );
        tracing::debug!(%id, concrete = %stored.concrete_type(), "extension artifact generated");
        Ok(stored)
    }

    /// Get cached artifact without generating
    #[must_use]
    pub fn get(&self, key: &CompositionKey) -> Option<Arc<Artifact>> {
        let guard = self.state.lock();
        let state = guard.borrow();
        state.artifacts.get(key).cloned()
    }

    /// Insert artifact under its own key unless an entry exists
    ///
    /// Returns `true` if inserted. An existing entry is kept untouched.
    pub fn populate(&self, artifact: Artifact) -> bool {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        if state.artifacts.contains_key(artifact.key()) {
            state.stats.populate_conflicts += 1;
            return false;
        }
        state.stats.populated += 1;
        state
            .artifacts
            .insert(artifact.key().clone(), Arc::new(artifact));
        true
    }

    /// Insert extension artifact under its identifier unless an entry exists
    ///
    /// Returns `true` if inserted.
    pub fn populate_sub_artifact(&self, extension: ExtensionArtifact) -> bool {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        if state
            .extension_artifacts
            .contains_key(extension.identifier())
        {
            state.stats.populate_conflicts += 1;
            return false;
        }
        state.stats.populated += 1;
        state
            .extension_artifacts
            .insert(extension.identifier().clone(), Arc::new(extension));
        true
    }

    /// Check artifact exists for `key`
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &CompositionKey) -> bool {
        self.get(key).is_some()
    }

    /// Number of cached base artifacts
    #[must_use]
    pub fn len(&self) -> usize {
        let guard = self.state.lock();
        let state = guard.borrow();
        state.artifacts.len()
    }

    /// Check no base artifact is cached
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of cached extension artifacts
    #[must_use]
    pub fn sub_artifact_count(&self) -> usize {
        let guard = self.state.lock();
        let state = guard.borrow();
        state.extension_artifacts.len()
    }

    /// Snapshot of cache counters
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let guard = self.state.lock();
        let state = guard.borrow();
        state.stats
    }

    fn lookup<T>(
        cell: &RefCell<CacheState>,
        find: impl FnOnce(&CacheState) -> Option<T>,
    ) -> Option<T> {
        let mut state = cell.borrow_mut();
        let found = find(&state);
        if found.is_some() {
            state.stats.hits += 1;
        }
        found
    }

    /// Run `generate` with `target` marked in flight
    ///
    /// No `RefCell` borrow is held while the generator runs, so it may
    /// re-enter the cache.
    fn run_generator<T>(
        &self,
        cell: &RefCell<CacheState>,
        target: &GenerationTarget,
        generate: impl FnOnce() -> Result<T, GenerationError>,
    ) -> Result<T, CacheError> {
        {
            let mut state = cell.borrow_mut();
            state.stats.misses += 1;
            if state.in_flight.contains(target) {
                return Err(CacheError::RecursiveGeneration {
                    target: target.clone(),
                });
            }
            // top-level generation is never counted against the limit
            if state.in_flight.len() > self.config.max_generation_depth {
                return Err(CacheError::GenerationDepthExceeded {
                    target: target.clone(),
                    depth: self.config.max_generation_depth,
                });
            }
            state.in_flight.push(target.clone());
        }

        let in_flight = InFlight { state: cell };
        tracing::debug!(%target, "invoking generator");
        let result = generate();
        drop(in_flight);

        result.map_err(|source| {
            cell.borrow_mut().stats.generation_failures += 1;
            tracing::warn!(%target, error = %source, "generation failed");
            CacheError::Generation {
                target: target.clone(),
                source,
            }
        })
    }
}

impl fmt::Debug for CompositionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositionCache")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
