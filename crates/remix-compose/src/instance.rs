//! Runtime instances
//!
//! Extension instances are type-erased behind [`Instance`]; slot matching only
//! needs their runtime type.

use remix_model::{Artifact, TypeRef};
use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

/// Live object with a known runtime type
pub trait Instance: Any + Send + Sync + Debug {
    /// Runtime type used for slot matching
    fn runtime_type(&self) -> &TypeRef;

    /// Downcast support
    fn as_any(&self) -> &dyn Any;
}

/// Shared instance reference
pub type InstanceRef = Arc<dyn Instance>;

/// Instance of a type without extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainObject {
    ty: TypeRef,
}

impl PlainObject {
    /// Create instance of `ty`
    #[inline]
    #[must_use]
    pub fn new(ty: TypeRef) -> Self {
        Self { ty }
    }

    /// Create shared instance of `ty`
    #[inline]
    #[must_use]
    pub fn shared(ty: impl Into<TypeRef>) -> InstanceRef {
        Arc::new(Self::new(ty.into()))
    }
}

impl Instance for PlainObject {
    fn runtime_type(&self) -> &TypeRef {
        &self.ty
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Instance of a composed artifact together with its extension array
///
/// Holds the artifact so it stays dereferenceable for the instance's lifetime.
#[derive(Debug)]
pub struct ComposedObject {
    artifact: Arc<Artifact>,
    extensions: Vec<InstanceRef>,
}

impl ComposedObject {
    /// Create composed instance
    #[inline]
    #[must_use]
    pub fn new(artifact: Arc<Artifact>, extensions: Vec<InstanceRef>) -> Self {
        Self {
            artifact,
            extensions,
        }
    }

    /// Artifact this instance was created from
    #[inline]
    #[must_use]
    pub fn artifact(&self) -> &Arc<Artifact> {
        &self.artifact
    }

    /// Extension instances, indexed by slot
    #[inline]
    #[must_use]
    pub fn extensions(&self) -> &[InstanceRef] {
        &self.extensions
    }

    /// Extension at slot `index`
    #[inline]
    #[must_use]
    pub fn extension(&self, index: usize) -> Option<&InstanceRef> {
        self.extensions.get(index)
    }
}

impl Instance for ComposedObject {
    fn runtime_type(&self) -> &TypeRef {
        self.artifact.produced().produced_type()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
