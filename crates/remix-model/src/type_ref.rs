//! Structural type references
//!
//! Provides [`TypeRef`], the identity used for base types, extension types and
//! synthesized artifact types. Equality is structural so independently
//! reconstructed references compare equal.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural reference to a (possibly generic) type
///
/// # Invariants
/// - Two references are equal iff name and every argument are equal
/// - A reference is *closed* iff no [`TypeRef::Param`] occurs anywhere in it
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TypeRef {
    /// Named type, optionally closed over generic arguments
    Named {
        /// Fully qualified type name
        name: String,
        /// Generic arguments in declaration order
        args: Vec<TypeRef>,
    },

    /// Open generic parameter
    Param(String),
}

impl TypeRef {
    /// Create non-generic named type
    #[inline]
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Create generic type closed (or partially closed) over `args`
    #[must_use]
    pub fn generic(name: impl Into<String>, args: impl IntoIterator<Item = TypeRef>) -> Self {
        Self::Named {
            name: name.into(),
            args: args.into_iter().collect(),
        }
    }

    /// Create open generic parameter
    #[inline]
    #[must_use]
    pub fn param(name: impl Into<String>) -> Self {
        Self::Param(name.into())
    }

    /// Type name (parameter name for open parameters)
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Named { name, .. } | Self::Param(name) => name,
        }
    }

    /// Generic arguments (empty for parameters)
    #[inline]
    #[must_use]
    pub fn args(&self) -> &[TypeRef] {
        match self {
            Self::Named { args, .. } => args,
            Self::Param(_) => &[],
        }
    }

    /// Check that no open generic parameter remains
    #[must_use]
    pub fn is_closed(&self) -> bool {
        match self {
            Self::Named { args, .. } => args.iter().all(TypeRef::is_closed),
            Self::Param(_) => false,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Param(name) => write!(f, "{name}"),
            Self::Named { name, args } if args.is_empty() => write!(f, "{name}"),
            Self::Named { name, args } => {
                write!(f, "{name}<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")
            }
        }
    }
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}
