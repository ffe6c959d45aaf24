//! Construction collaborators
//!
//! [`InstanceFactory`] default-constructs instances for unfilled slots.
//! [`ObjectConstructor`] turns an artifact plus a finished extension array
//! into a live object.

use crate::error::CompositionError;
use crate::instance::{ComposedObject, InstanceRef, PlainObject};
use remix_model::{Artifact, TypeKind, TypeRef, TypeRegistry, TypeSystem};
use std::sync::Arc;

/// Default construction for unfilled extension slots
pub trait InstanceFactory {
    /// Parameterless construction of a value type
    fn construct_value(&self, ty: &TypeRef) -> Option<InstanceRef>;

    /// Construction of a reference type through the object pipeline
    ///
    /// `Ok(None)` means the type has no usable constructor.
    ///
    /// # Errors
    /// Returns error if construction was attempted and failed
    fn construct_object(&self, ty: &TypeRef) -> Result<Option<InstanceRef>, CompositionError>;
}

/// Creates live objects
pub trait ObjectConstructor: Send + Sync {
    /// Create composed instance from a fully built extension array
    ///
    /// # Errors
    /// Returns [`CompositionError::Construction`] if instantiation fails
    fn construct_composed(
        &self,
        artifact: &Arc<Artifact>,
        extensions: Vec<InstanceRef>,
    ) -> Result<InstanceRef, CompositionError>;

    /// Create instance of a reference type without extensions
    fn construct_plain(&self, ty: &TypeRef) -> Option<InstanceRef>;

    /// Create instance of a value type with its parameterless constructor
    fn construct_value(&self, ty: &TypeRef) -> Option<InstanceRef>;
}

/// Object constructor backed by a [`TypeRegistry`]
///
/// A type is constructible iff it is registered as default-constructible with
/// the matching [`TypeKind`].
#[derive(Debug, Clone)]
pub struct DefaultObjectConstructor {
    types: Arc<TypeRegistry>,
}

impl DefaultObjectConstructor {
    /// Create constructor over `types`
    #[inline]
    #[must_use]
    pub fn new(types: Arc<TypeRegistry>) -> Self {
        Self { types }
    }

    fn construct_kind(&self, ty: &TypeRef, kind: TypeKind) -> Option<InstanceRef> {
        (self.types.kind(ty) == Some(kind) && self.types.is_default_constructible(ty))
            .then(|| PlainObject::shared(ty.clone()))
    }
}

impl ObjectConstructor for DefaultObjectConstructor {
    fn construct_composed(
        &self,
        artifact: &Arc<Artifact>,
        extensions: Vec<InstanceRef>,
    ) -> Result<InstanceRef, CompositionError> {
        if extensions.len() != artifact.slots().len() {
            return Err(CompositionError::Construction(format!(
                "{} expects {} extensions, got {}",
                artifact.key().base(),
                artifact.slots().len(),
                extensions.len()
            )));
        }
        Ok(Arc::new(ComposedObject::new(Arc::clone(artifact), extensions)))
    }

    fn construct_plain(&self, ty: &TypeRef) -> Option<InstanceRef> {
        self.construct_kind(ty, TypeKind::Reference)
    }

    fn construct_value(&self, ty: &TypeRef) -> Option<InstanceRef> {
        self.construct_kind(ty, TypeKind::Value)
    }
}

impl InstanceFactory for DefaultObjectConstructor {
    fn construct_value(&self, ty: &TypeRef) -> Option<InstanceRef> {
        ObjectConstructor::construct_value(self, ty)
    }

    fn construct_object(&self, ty: &TypeRef) -> Result<Option<InstanceRef>, CompositionError> {
        Ok(self.construct_plain(ty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remix_model::TypeInfo;

    fn constructor() -> DefaultObjectConstructor {
        let types = TypeRegistry::new();
        types.register(TypeInfo::class("ExtA".into())).unwrap();
        types.register(TypeInfo::value("Counter".into())).unwrap();
        types
            .register(TypeInfo::class("NeedsArgs".into()).without_default_constructor())
            .unwrap();
        DefaultObjectConstructor::new(Arc::new(types))
    }

    #[test]
    fn constructs_by_kind() {
        let constructor = constructor();
        assert!(constructor.construct_plain(&"ExtA".into()).is_some());
        assert!(ObjectConstructor::construct_value(&constructor, &"Counter".into()).is_some());

        // kind must match the requested construction path
        assert!(constructor.construct_plain(&"Counter".into()).is_none());
        assert!(ObjectConstructor::construct_value(&constructor, &"ExtA".into()).is_none());
    }

    #[test]
    fn missing_constructor_yields_none() {
        let constructor = constructor();
        assert!(constructor.construct_plain(&"NeedsArgs".into()).is_none());
        assert!(constructor.construct_plain(&"Unregistered".into()).is_none());
    }
}
