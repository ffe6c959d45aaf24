//! Error types for the data model

use crate::type_ref::TypeRef;

/// Errors raised while building model values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Slot indices are not exactly `0..len`
    #[error("invalid slot layout for {base}: {reason}")]
    InvalidSlotLayout {
        /// Base type of the composition
        base: TypeRef,
        /// What is wrong with the layout
        reason: String,
    },

    /// Type registered twice
    #[error("type already registered: {0}")]
    DuplicateType(TypeRef),

    /// Base or interface of a registered type is unknown
    #[error("type {ty} references unregistered supertype {supertype}")]
    UnknownSupertype {
        /// Type being registered
        ty: TypeRef,
        /// Missing supertype
        supertype: TypeRef,
    },
}
