//! Error types for instance composition
//!
//! Every slot-matching error names the outer base type and the slot involved
//! so a misconfiguration can be diagnosed from the error alone.

use remix_cache::CacheError;
use remix_model::TypeRef;

/// Instance composition errors
#[derive(Debug, thiserror::Error)]
pub enum CompositionError {
    /// Supplied instance has the declared type but the slot needs a specialized subtype
    #[error(
        "extension of type {supplied} for {base} slot {slot} is ambiguous: \
         slot declares {declared} but requires specialized subtype {required}"
    )]
    AmbiguousDerivation {
        /// Outer base type
        base: TypeRef,
        /// Slot index
        slot: usize,
        /// Declared extension type
        declared: TypeRef,
        /// Specialized subtype the slot requires
        required: TypeRef,
        /// Runtime type of the supplied instance
        supplied: TypeRef,
    },

    /// Supplied instance matches no slot
    #[error("extension of type {supplied} matches no extension slot of {base}")]
    UnmatchedExtension {
        /// Outer base type
        base: TypeRef,
        /// Runtime type of the supplied instance
        supplied: TypeRef,
    },

    /// Two supplied instances match the same slot
    #[error(
        "{base} slot {slot} ({declared}) matched twice: by {first} and by {second}"
    )]
    DuplicateExtensionAssignment {
        /// Outer base type
        base: TypeRef,
        /// Slot index
        slot: usize,
        /// Declared extension type
        declared: TypeRef,
        /// Runtime type of the instance assigned first
        first: TypeRef,
        /// Runtime type of the conflicting instance
        second: TypeRef,
    },

    /// Unfilled slot's type cannot be default-constructed
    #[error("no default constructor for {slot_type} in {base} slot {slot}")]
    NoDefaultConstructor {
        /// Outer base type
        base: TypeRef,
        /// Slot index
        slot: usize,
        /// Concrete type the slot expects
        slot_type: TypeRef,
    },

    /// Candidate array has the wrong length
    #[error("{base} expects {expected} extensions, got {actual}")]
    LengthMismatch {
        /// Outer base type
        base: TypeRef,
        /// Declared slot count
        expected: usize,
        /// Candidate length
        actual: usize,
    },

    /// Candidate array element has the wrong type
    #[error("{base} slot {slot} expects {expected}, got {actual}")]
    SlotTypeMismatch {
        /// Outer base type
        base: TypeRef,
        /// Slot index
        slot: usize,
        /// Concrete type the slot expects
        expected: TypeRef,
        /// Runtime type found in the candidate
        actual: TypeRef,
    },

    /// Specialized subtype has not been generated yet
    #[error("specialized subtype of {declared} for {base} slot {slot} is not generated")]
    UnresolvedSpecialization {
        /// Outer base type
        base: TypeRef,
        /// Slot index
        slot: usize,
        /// Declared extension type
        declared: TypeRef,
    },

    /// Extensions supplied for a type without configured extensions
    #[error("{ty} has no configured extensions but {supplied} were supplied")]
    NoExtensionsConfigured {
        /// Requested type
        ty: TypeRef,
        /// Number of supplied extensions
        supplied: usize,
    },

    /// Plain type cannot be constructed
    #[error("{ty} cannot be constructed")]
    NotConstructible {
        /// Requested type
        ty: TypeRef,
    },

    /// Recursive default construction nested too deeply
    #[error("composition of {ty} exceeds nesting depth {depth}")]
    NestingTooDeep {
        /// Type at which the limit was hit
        ty: TypeRef,
        /// Configured limit
        depth: usize,
    },

    /// Object constructor failed
    #[error("construction failed: {0}")]
    Construction(String),

    /// Artifact resolution failed
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
}

impl CompositionError {
    /// Check error signals a caller-side configuration or usage defect
    #[inline]
    #[must_use]
    pub fn is_configuration_defect(&self) -> bool {
        matches!(
            self,
            Self::AmbiguousDerivation { .. }
                | Self::UnmatchedExtension { .. }
                | Self::DuplicateExtensionAssignment { .. }
                | Self::NoDefaultConstructor { .. }
                | Self::LengthMismatch { .. }
                | Self::SlotTypeMismatch { .. }
                | Self::NoExtensionsConfigured { .. }
        )
    }
}

/// Result type alias for composition operations
pub type CompositionResult<T> = Result<T, CompositionError>;
