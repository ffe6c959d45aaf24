//! Composition keys
//!
//! Provides [`CompositionKey`] ("this base type with exactly these ordered
//! extensions") and [`ExtensionIdentifier`], the nested key under which a
//! specialized extension subtype is cached.

use crate::type_ref::TypeRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural identity of a base type composed with an ordered extension list
///
/// # Invariants
/// - Equality and hashing are structural over base and the full extension list
/// - Extension order is significant; the list is never treated as a set
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompositionKey {
    base: TypeRef,
    extensions: Vec<TypeRef>,
}

impl CompositionKey {
    /// Create key for base type and ordered extensions
    #[must_use]
    pub fn new(base: TypeRef, extensions: impl IntoIterator<Item = TypeRef>) -> Self {
        Self {
            base,
            extensions: extensions.into_iter().collect(),
        }
    }

    /// Base type
    #[inline]
    #[must_use]
    pub fn base(&self) -> &TypeRef {
        &self.base
    }

    /// Extensions in declaration order
    #[inline]
    #[must_use]
    pub fn extensions(&self) -> &[TypeRef] {
        &self.extensions
    }

    /// Check base and every extension are free of open generic parameters
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.base.is_closed() && self.extensions.iter().all(TypeRef::is_closed)
    }
}

impl fmt::Display for CompositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} with [", self.base)?;
        for (i, ext) in self.extensions.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{ext}")?;
        }
        f.write_str("]")
    }
}

/// Nested key for a specialized extension subtype
///
/// The same declared extension type can require different specialized
/// subtypes depending on the composition it participates in, so the owning
/// key is part of the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtensionIdentifier {
    owner: CompositionKey,
    extension: TypeRef,
}

impl ExtensionIdentifier {
    /// Create identifier for `extension` as composed into `owner`
    #[inline]
    #[must_use]
    pub fn new(owner: CompositionKey, extension: TypeRef) -> Self {
        Self { owner, extension }
    }

    /// Owning composition
    #[inline]
    #[must_use]
    pub fn owner(&self) -> &CompositionKey {
        &self.owner
    }

    /// Declared extension type
    #[inline]
    #[must_use]
    pub fn extension(&self) -> &TypeRef {
        &self.extension
    }
}

impl fmt::Display for ExtensionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in ({})", self.extension, self.owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn extension_order_matters() {
        let a = CompositionKey::new("Base".into(), ["A".into(), "B".into()]);
        let b = CompositionKey::new("Base".into(), ["B".into(), "A".into()]);
        assert_ne!(a, b);
    }

    #[test]
    fn open_extension_makes_key_open() {
        let key = CompositionKey::new(
            "Base".into(),
            [TypeRef::generic("Ext", [TypeRef::param("T")])],
        );
        assert!(!key.is_closed());
    }

    #[test]
    fn display_lists_extensions() {
        let key = CompositionKey::new("Base".into(), ["A".into(), "B".into()]);
        assert_eq!(key.to_string(), "Base with [A, B]");
    }

    proptest! {
        #[test]
        fn independently_built_keys_are_equal(
            base in "[A-Z][a-z]{0,6}",
            exts in proptest::collection::vec("[A-Z][a-z]{0,6}", 0..6),
        ) {
            let a = CompositionKey::new(
                TypeRef::named(base.clone()),
                exts.iter().map(|e| TypeRef::named(e.clone())),
            );
            let b = CompositionKey::new(
                TypeRef::named(base),
                exts.into_iter().map(TypeRef::named).collect::<Vec<_>>(),
            );
            prop_assert_eq!(hash_of(&a), hash_of(&b));
            prop_assert_eq!(a, b);
        }
    }
}
