//! Instance composition initializer
//!
//! Builds the extension array handed to the object constructor for one
//! composed instance.
//!
//! # Algorithm
//! 1. Resolve each slot's concrete expected type. Specialized slots resolve
//!    through the cache under the nested [`ExtensionIdentifier`].
//! 2. Place every supplied instance into the first slot (declaration order)
//!    whose concrete type accepts its runtime type.
//! 3. Default-construct every slot still empty.
//!
//! The result is addressed purely by slot index; the generated artifact wires
//! its call proxies by index, so the array is never reordered.

use crate::constructor::InstanceFactory;
use crate::error::{CompositionError, CompositionResult};
use crate::instance::InstanceRef;
use remix_cache::CompositionCache;
use remix_model::{Artifact, ExtensionIdentifier, ExtensionSlot, TypeKind, TypeRef, TypeSystem};
use std::sync::Arc;

/// Slot with its concrete expected type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSlot {
    /// Declared slot
    pub slot: ExtensionSlot,
    /// Type an instance in this slot must be assignable to
    pub concrete_type: TypeRef,
}

/// How specialized subtypes missing from the cache are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    GenerateMissing,
    CachedOnly,
}

/// Matches supplied extension instances to an artifact's slots
#[derive(Clone, Copy)]
pub struct InstanceCompositionInitializer<'a> {
    cache: &'a CompositionCache,
    types: &'a dyn TypeSystem,
}

impl<'a> InstanceCompositionInitializer<'a> {
    /// Create initializer resolving specializations through `cache`
    #[inline]
    #[must_use]
    pub fn new(cache: &'a CompositionCache, types: &'a dyn TypeSystem) -> Self {
        Self { cache, types }
    }

    /// Resolve the concrete expected type of every slot, in declaration order
    ///
    /// Specialized subtypes not cached yet are generated on demand.
    ///
    /// # Errors
    /// Returns [`CompositionError::Cache`] if a specialized subtype cannot be generated
    pub fn resolve_slots(&self, artifact: &Artifact) -> CompositionResult<Vec<ResolvedSlot>> {
        self.resolve(artifact, Resolution::GenerateMissing)
    }

    /// Build the extension array for `artifact`
    ///
    /// Returns an array of length `artifact.slots().len()` with every supplied
    /// instance at its matched slot index and default instances elsewhere.
    /// The order of `supplied` does not affect the result.
    ///
    /// # Errors
    /// - [`CompositionError::AmbiguousDerivation`] if an instance has a slot's declared
    ///   type where a specialized subtype is required
    /// - [`CompositionError::UnmatchedExtension`] if an instance matches no slot
    /// - [`CompositionError::DuplicateExtensionAssignment`] if two instances match one slot
    /// - [`CompositionError::NoDefaultConstructor`] if an empty slot cannot be filled
    pub fn build_extension_array(
        &self,
        artifact: &Artifact,
        supplied: &[InstanceRef],
        factory: &dyn InstanceFactory,
    ) -> CompositionResult<Vec<InstanceRef>> {
        let resolved = self.resolve_slots(artifact)?;
        let mut assigned: Vec<Option<InstanceRef>> = vec![None; resolved.len()];

        for instance in supplied {
            let runtime = instance.runtime_type();
            let Some(target) = resolved
                .iter()
                .find(|r| self.types.is_assignable(&r.concrete_type, runtime))
            else {
                return Err(self.unmatched(artifact, &resolved, runtime));
            };

            let cell = &mut assigned[target.slot.index];
            if let Some(existing) = cell {
                return Err(CompositionError::DuplicateExtensionAssignment {
                    base: artifact.key().base().clone(),
                    slot: target.slot.index,
                    declared: target.slot.declared_type.clone(),
                    first: existing.runtime_type().clone(),
                    second: runtime.clone(),
                });
            }
            *cell = Some(Arc::clone(instance));
        }

        let mut by_index: Vec<&ResolvedSlot> = resolved.iter().collect();
        by_index.sort_by_key(|r| r.slot.index);

        by_index
            .into_iter()
            .zip(assigned)
            .map(|(slot, cell)| match cell {
                Some(instance) => Ok(instance),
                None => self.construct_default(artifact, slot, factory),
            })
            .collect()
    }

    /// Check an externally built extension array without constructing anything
    ///
    /// Specialized subtypes must already be cached.
    ///
    /// # Errors
    /// - [`CompositionError::LengthMismatch`] if the array length differs from the slot count
    /// - [`CompositionError::SlotTypeMismatch`] if an element does not fit its slot
    /// - [`CompositionError::UnresolvedSpecialization`] if a specialized subtype is not cached
    pub fn validate(
        &self,
        artifact: &Artifact,
        candidate: &[InstanceRef],
    ) -> CompositionResult<()> {
        let resolved = self.resolve(artifact, Resolution::CachedOnly)?;
        if candidate.len() != resolved.len() {
            return Err(CompositionError::LengthMismatch {
                base: artifact.key().base().clone(),
                expected: resolved.len(),
                actual: candidate.len(),
            });
        }

        for r in &resolved {
            let actual = candidate[r.slot.index].runtime_type();
            if !self.types.is_assignable(&r.concrete_type, actual) {
                return Err(CompositionError::SlotTypeMismatch {
                    base: artifact.key().base().clone(),
                    slot: r.slot.index,
                    expected: r.concrete_type.clone(),
                    actual: actual.clone(),
                });
            }
        }
        Ok(())
    }

    fn resolve(
        &self,
        artifact: &Artifact,
        mode: Resolution,
    ) -> CompositionResult<Vec<ResolvedSlot>> {
        artifact
            .slots()
            .iter()
            .map(|slot| {
                let concrete_type = if slot.requires_specialized_subtype {
                    self.specialized_type(artifact, slot, mode)?
                } else {
                    slot.declared_type.clone()
                };
                Ok(ResolvedSlot {
                    slot: slot.clone(),
                    concrete_type,
                })
            })
            .collect()
    }

    fn specialized_type(
        &self,
        artifact: &Artifact,
        slot: &ExtensionSlot,
        mode: Resolution,
    ) -> CompositionResult<TypeRef> {
        let id = ExtensionIdentifier::new(artifact.key().clone(), slot.declared_type.clone());
        if let Some(sub) = self.cache.get_sub_artifact(&id) {
            return Ok(sub.concrete_type().clone());
        }

        match mode {
            Resolution::CachedOnly => Err(CompositionError::UnresolvedSpecialization {
                base: artifact.key().base().clone(),
                slot: slot.index,
                declared: slot.declared_type.clone(),
            }),
            Resolution::GenerateMissing => {
                tracing::debug!(%id, "specialized subtype not cached, generating");
                let sub = self.cache.get_or_create_sub_artifact(&id)?;
                Ok(sub.concrete_type().clone())
            }
        }
    }

    fn unmatched(
        &self,
        artifact: &Artifact,
        resolved: &[ResolvedSlot],
        runtime: &TypeRef,
    ) -> CompositionError {
        let base = artifact.key().base().clone();
        let declared_match = resolved.iter().find(|r| {
            r.slot.requires_specialized_subtype
                && self.types.is_assignable(&r.slot.declared_type, runtime)
        });

        match declared_match {
            Some(r) => CompositionError::AmbiguousDerivation {
                base,
                slot: r.slot.index,
                declared: r.slot.declared_type.clone(),
                required: r.concrete_type.clone(),
                supplied: runtime.clone(),
            },
            None => CompositionError::UnmatchedExtension {
                base,
                supplied: runtime.clone(),
            },
        }
    }

    fn construct_default(
        &self,
        artifact: &Artifact,
        resolved: &ResolvedSlot,
        factory: &dyn InstanceFactory,
    ) -> CompositionResult<InstanceRef> {
        let ty = &resolved.concrete_type;
        let kind = self.types.kind(ty).unwrap_or_default();
        tracing::trace!(slot = resolved.slot.index, %ty, ?kind, "default-constructing extension");

        let instance = match kind {
            TypeKind::Value => factory.construct_value(ty),
            TypeKind::Reference => factory.construct_object(ty)?,
        };
        instance.ok_or_else(|| CompositionError::NoDefaultConstructor {
            base: artifact.key().base().clone(),
            slot: resolved.slot.index,
            slot_type: ty.clone(),
        })
    }
}

impl std::fmt::Debug for InstanceCompositionInitializer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceCompositionInitializer")
            .field("cache", self.cache)
            .finish_non_exhaustive()
    }
}
