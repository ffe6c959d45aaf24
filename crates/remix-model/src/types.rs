//! Type system seam
//!
//! Slot matching needs to ask "is a value of runtime type S usable where T is
//! expected?" and "how is T default-constructed?". [`TypeSystem`] is that
//! question; [`TypeRegistry`] is a nominal, thread-safe answer to it.

use crate::error::ModelError;
use crate::type_ref::TypeRef;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Construction category of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TypeKind {
    /// Constructed through the object construction pipeline (may be composed)
    #[default]
    Reference,

    /// Constructed with a parameterless constructor
    Value,
}

/// Assignability and construction oracle
pub trait TypeSystem: Send + Sync {
    /// Check a value of runtime type `source` is usable where `target` is expected
    fn is_assignable(&self, target: &TypeRef, source: &TypeRef) -> bool;

    /// Construction category, `None` for unknown types
    fn kind(&self, ty: &TypeRef) -> Option<TypeKind>;
}

/// Registered type description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInfo {
    /// Type identity
    pub ty: TypeRef,
    /// Construction category
    #[serde(default)]
    pub kind: TypeKind,
    /// Direct base type
    #[serde(default)]
    pub base: Option<TypeRef>,
    /// Directly implemented interfaces
    #[serde(default)]
    pub interfaces: Vec<TypeRef>,
    /// Has a usable parameterless constructor
    #[serde(default = "default_true")]
    pub default_constructible: bool,
}

fn default_true() -> bool {
    true
}

impl TypeInfo {
    /// Default-constructible reference type with no supertypes
    #[inline]
    #[must_use]
    pub fn class(ty: TypeRef) -> Self {
        Self {
            ty,
            kind: TypeKind::Reference,
            base: None,
            interfaces: Vec::new(),
            default_constructible: true,
        }
    }

    /// Default-constructible value type
    #[inline]
    #[must_use]
    pub fn value(ty: TypeRef) -> Self {
        Self {
            kind: TypeKind::Value,
            ..Self::class(ty)
        }
    }

    /// Set base type
    #[inline]
    #[must_use]
    pub fn derives(mut self, base: TypeRef) -> Self {
        self.base = Some(base);
        self
    }

    /// Add implemented interface
    #[inline]
    #[must_use]
    pub fn implements(mut self, interface: TypeRef) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Mark as lacking a parameterless constructor
    #[inline]
    #[must_use]
    pub fn without_default_constructor(mut self) -> Self {
        self.default_constructible = false;
        self
    }
}

/// Nominal type registry
///
/// Assignability is reflexive and follows base chains and interfaces
/// transitively. Unknown types are only assignable to themselves.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: DashMap<TypeRef, TypeInfo>,
}

impl TypeRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: DashMap::new(),
        }
    }

    /// Register type
    ///
    /// # Errors
    /// - [`ModelError::DuplicateType`] if already registered
    /// - [`ModelError::UnknownSupertype`] if base or an interface is not registered
    pub fn register(&self, info: TypeInfo) -> Result<(), ModelError> {
        for supertype in info.base.iter().chain(info.interfaces.iter()) {
            if !self.types.contains_key(supertype) {
                return Err(ModelError::UnknownSupertype {
                    ty: info.ty.clone(),
                    supertype: supertype.clone(),
                });
            }
        }

        match self.types.entry(info.ty.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(ModelError::DuplicateType(info.ty)),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(info);
                Ok(())
            }
        }
    }

    /// Look up registered type
    #[must_use]
    pub fn get(&self, ty: &TypeRef) -> Option<TypeInfo> {
        self.types.get(ty).map(|entry| entry.value().clone())
    }

    /// Check type is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, ty: &TypeRef) -> bool {
        self.types.contains_key(ty)
    }

    /// Check `ty` is registered with a parameterless constructor
    #[must_use]
    pub fn is_default_constructible(&self, ty: &TypeRef) -> bool {
        self.types
            .get(ty)
            .is_some_and(|entry| entry.default_constructible)
    }

    /// Number of registered types
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn direct_supertypes(&self, ty: &TypeRef) -> Vec<TypeRef> {
        self.types
            .get(ty)
            .map(|entry| {
                entry
                    .base
                    .iter()
                    .chain(entry.interfaces.iter())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl TypeSystem for TypeRegistry {
    fn is_assignable(&self, target: &TypeRef, source: &TypeRef) -> bool {
        if target == source {
            return true;
        }

        let mut visited = HashSet::new();
        let mut pending = self.direct_supertypes(source);
        while let Some(next) = pending.pop() {
            if &next == target {
                return true;
            }
            if visited.insert(next.clone()) {
                pending.extend(self.direct_supertypes(&next));
            }
        }
        false
    }

    fn kind(&self, ty: &TypeRef) -> Option<TypeKind> {
        self.types.get(ty).map(|entry| entry.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TypeRegistry {
        let registry = TypeRegistry::new();
        registry.register(TypeInfo::class("IExt".into())).unwrap();
        registry
            .register(TypeInfo::class("ExtB".into()).implements("IExt".into()))
            .unwrap();
        registry
            .register(TypeInfo::class("ExtB_Derived".into()).derives("ExtB".into()))
            .unwrap();
        registry.register(TypeInfo::value("Counter".into())).unwrap();
        registry
    }

    #[test]
    fn assignability_is_reflexive() {
        let registry = registry();
        assert!(registry.is_assignable(&"ExtB".into(), &"ExtB".into()));
        assert!(registry.is_assignable(&"Unknown".into(), &"Unknown".into()));
    }

    #[test]
    fn assignability_follows_base_and_interfaces() {
        let registry = registry();
        assert!(registry.is_assignable(&"ExtB".into(), &"ExtB_Derived".into()));
        assert!(registry.is_assignable(&"IExt".into(), &"ExtB_Derived".into()));
        assert!(!registry.is_assignable(&"ExtB_Derived".into(), &"ExtB".into()));
    }

    #[test]
    fn kind_lookup() {
        let registry = registry();
        assert_eq!(registry.kind(&"Counter".into()), Some(TypeKind::Value));
        assert_eq!(registry.kind(&"ExtB".into()), Some(TypeKind::Reference));
        assert_eq!(registry.kind(&"Missing".into()), None);
    }

    #[test]
    fn duplicate_registration_rejected() {
        let registry = registry();
        let err = registry.register(TypeInfo::class("ExtB".into())).unwrap_err();
        assert_eq!(err, ModelError::DuplicateType("ExtB".into()));
    }

    #[test]
    fn unknown_supertype_rejected() {
        let registry = TypeRegistry::new();
        let err = registry
            .register(TypeInfo::class("Child".into()).derives("Parent".into()))
            .unwrap_err();
        assert!(matches!(err, ModelError::UnknownSupertype { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn type_info_deserializes_with_defaults() {
        let info: TypeInfo = serde_json::from_str(
            r#"{"ty":{"Named":{"name":"ExtA","args":[]}}}"#,
        )
        .unwrap();
        assert_eq!(info, TypeInfo::class("ExtA".into()));
    }
}
