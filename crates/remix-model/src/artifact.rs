//! Composed artifacts and their metadata records
//!
//! An [`Artifact`] is the synthesized, cacheable unit for one
//! [`CompositionKey`]. An [`ExtensionArtifact`] is the synthesized specialized
//! subtype of one extension within a composition. Both are immutable once
//! built and shared behind `Arc` by the cache and every composed instance.

use crate::error::ModelError;
use crate::key::{CompositionKey, ExtensionIdentifier};
use crate::type_ref::TypeRef;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Identity of a generator-produced artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactId(Uuid);

impl ArtifactId {
    /// Generate fresh random id
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap existing uuid
    #[inline]
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Underlying uuid
    #[inline]
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ArtifactId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Opaque handle to something a generator produced
///
/// The core only reads `produced_type`; `attributes` is free-form metadata
/// owned by the generator/decoder pair (descriptors are embedded there).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactHandle {
    id: ArtifactId,
    produced_type: TypeRef,
    #[serde(default)]
    attributes: BTreeMap<String, String>,
}

impl ArtifactHandle {
    /// Create handle with fresh id
    #[inline]
    #[must_use]
    pub fn new(produced_type: TypeRef) -> Self {
        Self::with_id(ArtifactId::new(), produced_type)
    }

    /// Create handle with explicit id
    #[inline]
    #[must_use]
    pub fn with_id(id: ArtifactId, produced_type: TypeRef) -> Self {
        Self {
            id,
            produced_type,
            attributes: BTreeMap::new(),
        }
    }

    /// Handle id
    #[inline]
    #[must_use]
    pub fn id(&self) -> ArtifactId {
        self.id
    }

    /// Type produced by the generator
    #[inline]
    #[must_use]
    pub fn produced_type(&self) -> &TypeRef {
        &self.produced_type
    }

    /// Look up attribute
    #[inline]
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Set attribute, returning the previous value
    pub fn set_attribute(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        self.attributes.insert(name.into(), value.into())
    }

    /// All attributes
    #[inline]
    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }
}

/// Reference to a method on a type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodHandle {
    declaring_type: TypeRef,
    name: String,
}

impl MethodHandle {
    /// Create method handle
    #[inline]
    #[must_use]
    pub fn new(declaring_type: TypeRef, name: impl Into<String>) -> Self {
        Self {
            declaring_type,
            name: name.into(),
        }
    }

    /// Declaring type
    #[inline]
    #[must_use]
    pub fn declaring_type(&self) -> &TypeRef {
        &self.declaring_type
    }

    /// Method name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for MethodHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.declaring_type, self.name)
    }
}

/// Original method -> wrapper method pairs
pub type MethodWrappers = IndexMap<MethodHandle, MethodHandle>;

/// One declared position in an artifact's composition
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtensionSlot {
    /// Extension type as declared in the composition
    pub declared_type: TypeRef,
    /// Slot expects a further-derived subtype of `declared_type`
    pub requires_specialized_subtype: bool,
    /// Definitive position in the extension array
    pub index: usize,
}

impl ExtensionSlot {
    /// Slot taking `declared_type` verbatim
    #[inline]
    #[must_use]
    pub fn plain(declared_type: TypeRef, index: usize) -> Self {
        Self {
            declared_type,
            requires_specialized_subtype: false,
            index,
        }
    }

    /// Slot requiring a specialized subtype of `declared_type`
    #[inline]
    #[must_use]
    pub fn specialized(declared_type: TypeRef, index: usize) -> Self {
        Self {
            declared_type,
            requires_specialized_subtype: true,
            index,
        }
    }
}

fn check_slot_layout(base: &TypeRef, slots: &[ExtensionSlot]) -> Result<(), ModelError> {
    let mut seen = vec![false; slots.len()];
    for slot in slots {
        let reason = match seen.get_mut(slot.index) {
            None => format!("slot index {} out of range 0..{}", slot.index, slots.len()),
            Some(true) => format!("duplicate slot index {}", slot.index),
            Some(flag) => {
                *flag = true;
                continue;
            }
        };
        return Err(ModelError::InvalidSlotLayout {
            base: base.clone(),
            reason,
        });
    }
    Ok(())
}

/// Synthesized composed type
///
/// # Invariants
/// - Slot indices are exactly a permutation of `0..slots.len()`
/// - Immutable once shared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    key: CompositionKey,
    produced: ArtifactHandle,
    override_surface: Option<ArtifactHandle>,
    slots: Vec<ExtensionSlot>,
    method_wrappers: MethodWrappers,
}

impl Artifact {
    /// Create artifact
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidSlotLayout`] if slot indices are not `0..len`
    pub fn new(
        key: CompositionKey,
        produced: ArtifactHandle,
        slots: Vec<ExtensionSlot>,
    ) -> Result<Self, ModelError> {
        check_slot_layout(key.base(), &slots)?;
        Ok(Self {
            key,
            produced,
            override_surface: None,
            slots,
            method_wrappers: MethodWrappers::new(),
        })
    }

    /// Rebuild artifact from a decoded metadata record
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidSlotLayout`] if the recovered slots are inconsistent
    pub fn from_record(
        produced: ArtifactHandle,
        record: ArtifactMetadataRecord,
    ) -> Result<Self, ModelError> {
        let ArtifactMetadataRecord {
            key,
            slots,
            override_surface,
            method_wrappers,
        } = record;
        let mut artifact = Self::new(key, produced, slots)?.with_method_wrappers(method_wrappers);
        artifact.override_surface = override_surface;
        Ok(artifact)
    }

    /// Set override surface
    #[inline]
    #[must_use]
    pub fn with_override_surface(mut self, surface: ArtifactHandle) -> Self {
        self.override_surface = Some(surface);
        self
    }

    /// Add method wrapper pairs
    #[must_use]
    pub fn with_method_wrappers(
        mut self,
        pairs: impl IntoIterator<Item = (MethodHandle, MethodHandle)>,
    ) -> Self {
        self.method_wrappers.extend(pairs);
        self
    }

    /// Composition key
    #[inline]
    #[must_use]
    pub fn key(&self) -> &CompositionKey {
        &self.key
    }

    /// Produced artifact handle
    #[inline]
    #[must_use]
    pub fn produced(&self) -> &ArtifactHandle {
        &self.produced
    }

    /// Override surface handle, if the generator produced one
    #[inline]
    #[must_use]
    pub fn override_surface(&self) -> Option<&ArtifactHandle> {
        self.override_surface.as_ref()
    }

    /// Declared extension slots in declaration order
    #[inline]
    #[must_use]
    pub fn slots(&self) -> &[ExtensionSlot] {
        &self.slots
    }

    /// Original -> wrapper method map
    #[inline]
    #[must_use]
    pub fn method_wrappers(&self) -> &MethodWrappers {
        &self.method_wrappers
    }

    /// Wrapper for `original`, if any
    #[inline]
    #[must_use]
    pub fn wrapper_for(&self, original: &MethodHandle) -> Option<&MethodHandle> {
        self.method_wrappers.get(original)
    }

    /// Metadata record that reproduces this artifact's wiring
    #[must_use]
    pub fn to_record(&self) -> ArtifactMetadataRecord {
        ArtifactMetadataRecord {
            key: self.key.clone(),
            slots: self.slots.clone(),
            override_surface: self.override_surface.clone(),
            method_wrappers: self
                .method_wrappers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

/// Synthesized specialized subtype of one extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionArtifact {
    identifier: ExtensionIdentifier,
    produced: ArtifactHandle,
    method_wrappers: MethodWrappers,
}

impl ExtensionArtifact {
    /// Create extension artifact
    #[must_use]
    pub fn new(
        identifier: ExtensionIdentifier,
        produced: ArtifactHandle,
        method_wrappers: impl IntoIterator<Item = (MethodHandle, MethodHandle)>,
    ) -> Self {
        Self {
            identifier,
            produced,
            method_wrappers: method_wrappers.into_iter().collect(),
        }
    }

    /// Rebuild from decoded metadata record
    #[must_use]
    pub fn from_record(produced: ArtifactHandle, record: ExtensionMetadataRecord) -> Self {
        Self::new(record.identifier, produced, record.method_wrappers)
    }

    /// Nested key
    #[inline]
    #[must_use]
    pub fn identifier(&self) -> &ExtensionIdentifier {
        &self.identifier
    }

    /// Produced artifact handle
    #[inline]
    #[must_use]
    pub fn produced(&self) -> &ArtifactHandle {
        &self.produced
    }

    /// Concrete subtype a slot expects
    #[inline]
    #[must_use]
    pub fn concrete_type(&self) -> &TypeRef {
        self.produced.produced_type()
    }

    /// Original -> wrapper method map
    #[inline]
    #[must_use]
    pub fn method_wrappers(&self) -> &MethodWrappers {
        &self.method_wrappers
    }

    /// Metadata record that reproduces this artifact's wiring
    #[must_use]
    pub fn to_record(&self) -> ExtensionMetadataRecord {
        ExtensionMetadataRecord {
            identifier: self.identifier.clone(),
            method_wrappers: self
                .method_wrappers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

/// Decoded base-composition descriptor
///
/// Transient: consumed once to populate a cache, then dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadataRecord {
    /// Recovered composition key
    pub key: CompositionKey,
    /// Recovered extension slots
    pub slots: Vec<ExtensionSlot>,
    /// Recovered override surface
    #[serde(default)]
    pub override_surface: Option<ArtifactHandle>,
    /// Recovered original -> wrapper pairs
    #[serde(default)]
    pub method_wrappers: Vec<(MethodHandle, MethodHandle)>,
}

/// Decoded extension-composition descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionMetadataRecord {
    /// Recovered nested key
    pub identifier: ExtensionIdentifier,
    /// Recovered original -> wrapper pairs
    #[serde(default)]
    pub method_wrappers: Vec<(MethodHandle, MethodHandle)>,
}
