//! Composed object creation
//!
//! [`Composer`] runs the full pipeline for one `new` request: configuration
//! resolves a key, the cache resolves the artifact, the initializer builds the
//! extension array and the object constructor instantiates the result.
//!
//! The active configuration is an explicit argument, never ambient state.

use crate::constructor::{InstanceFactory, ObjectConstructor};
use crate::error::{CompositionError, CompositionResult};
use crate::initializer::InstanceCompositionInitializer;
use crate::instance::InstanceRef;
use indexmap::IndexMap;
use remix_cache::CompositionCache;
use remix_model::{CompositionKey, TypeRef, TypeSystem};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Maps a requested type to its composition key
pub trait ConfigurationResolver: Send + Sync {
    /// Key for `ty`, or `None` if it has no extensions
    fn resolve(&self, ty: &TypeRef) -> Option<CompositionKey>;
}

/// Explicit base type -> ordered extension list configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MixinConfiguration {
    classes: IndexMap<TypeRef, Vec<TypeRef>>,
}

impl MixinConfiguration {
    /// Create empty configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `extension` to the end of `base`'s extension list
    ///
    /// Adding the same extension twice keeps the first position.
    pub fn add_mixin(&mut self, base: TypeRef, extension: TypeRef) {
        let extensions = self.classes.entry(base).or_default();
        if !extensions.contains(&extension) {
            extensions.push(extension);
        }
    }

    /// Builder form of [`MixinConfiguration::add_mixin`]
    #[inline]
    #[must_use]
    pub fn with_mixin(mut self, base: impl Into<TypeRef>, extension: impl Into<TypeRef>) -> Self {
        self.add_mixin(base.into(), extension.into());
        self
    }

    /// Extensions configured for `base`
    #[inline]
    #[must_use]
    pub fn mixins_for(&self, base: &TypeRef) -> &[TypeRef] {
        self.classes.get(base).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of configured base types
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Check nothing is configured
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl ConfigurationResolver for MixinConfiguration {
    fn resolve(&self, ty: &TypeRef) -> Option<CompositionKey> {
        let extensions = self.mixins_for(ty);
        (!extensions.is_empty())
            .then(|| CompositionKey::new(ty.clone(), extensions.iter().cloned()))
    }
}

/// Composer settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Maximum depth of recursive composition through default-filled slots
    pub max_nesting_depth: usize,
}

impl ComposerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With maximum nesting depth
    #[inline]
    #[must_use]
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: 8,
        }
    }
}

/// Creates composed objects
pub struct Composer {
    cache: Arc<CompositionCache>,
    types: Arc<dyn TypeSystem>,
    constructor: Arc<dyn ObjectConstructor>,
    config: ComposerConfig,
}

impl Composer {
    /// Create composer
    #[must_use]
    pub fn new(
        cache: Arc<CompositionCache>,
        types: Arc<dyn TypeSystem>,
        constructor: Arc<dyn ObjectConstructor>,
    ) -> Self {
        Self {
            cache,
            types,
            constructor,
            config: ComposerConfig::default(),
        }
    }

    /// With explicit configuration
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: ComposerConfig) -> Self {
        self.config = config;
        self
    }

    /// Shared cache
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &Arc<CompositionCache> {
        &self.cache
    }

    /// Initializer over this composer's cache and type system
    #[inline]
    #[must_use]
    pub fn initializer(&self) -> InstanceCompositionInitializer<'_> {
        InstanceCompositionInitializer::new(&self.cache, self.types.as_ref())
    }

    /// Create an instance of `ty` under `configuration`
    ///
    /// `supplied` extension instances are placed into matching slots; every
    /// other slot is default-constructed, recursively composing extension
    /// types that have extensions of their own.
    ///
    /// # Errors
    /// - Any slot-matching error from [`InstanceCompositionInitializer::build_extension_array`]
    /// - [`CompositionError::NoExtensionsConfigured`] if `ty` has no extensions but some
    ///   were supplied
    /// - [`CompositionError::NotConstructible`] if `ty` has no usable constructor
    /// - [`CompositionError::NestingTooDeep`] on runaway recursive composition
    /// - [`CompositionError::Cache`] if the artifact cannot be generated
    pub fn new_object(
        &self,
        configuration: &dyn ConfigurationResolver,
        ty: &TypeRef,
        supplied: &[InstanceRef],
    ) -> CompositionResult<InstanceRef> {
        self.compose_at(configuration, ty, supplied, 0)
    }

    fn compose_at(
        &self,
        configuration: &dyn ConfigurationResolver,
        ty: &TypeRef,
        supplied: &[InstanceRef],
        depth: usize,
    ) -> CompositionResult<InstanceRef> {
        if depth > self.config.max_nesting_depth {
            return Err(CompositionError::NestingTooDeep {
                ty: ty.clone(),
                depth: self.config.max_nesting_depth,
            });
        }

        let Some(key) = configuration.resolve(ty) else {
            if !supplied.is_empty() {
                return Err(CompositionError::NoExtensionsConfigured {
                    ty: ty.clone(),
                    supplied: supplied.len(),
                });
            }
            return self
                .constructor
                .construct_plain(ty)
                .ok_or_else(|| CompositionError::NotConstructible { ty: ty.clone() });
        };

        let artifact = self.cache.get_or_create(&key)?;
        let factory = NestedFactory {
            composer: self,
            configuration,
            depth: depth + 1,
        };
        let extensions = self
            .initializer()
            .build_extension_array(&artifact, supplied, &factory)?;

        tracing::debug!(%key, depth, supplied = supplied.len(), "constructing composed object");
        self.constructor.construct_composed(&artifact, extensions)
    }
}

impl fmt::Debug for Composer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composer")
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Default construction one nesting level below the current composition
struct NestedFactory<'a> {
    composer: &'a Composer,
    configuration: &'a dyn ConfigurationResolver,
    depth: usize,
}

impl InstanceFactory for NestedFactory<'_> {
    fn construct_value(&self, ty: &TypeRef) -> Option<InstanceRef> {
        self.composer.constructor.construct_value(ty)
    }

    fn construct_object(&self, ty: &TypeRef) -> CompositionResult<Option<InstanceRef>> {
        match self.composer.compose_at(self.configuration, ty, &[], self.depth) {
            Ok(instance) => Ok(Some(instance)),
            Err(CompositionError::NotConstructible { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
