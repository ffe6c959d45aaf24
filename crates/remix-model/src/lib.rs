//! Remix Data Model
//!
//! Structural identity types for composed mixin artifacts.
//!
//! # Core Concepts
//!
//! - [`TypeRef`]: Structural reference to a (possibly generic) type
//! - [`CompositionKey`]: Base type + ordered extension list
//! - [`ExtensionIdentifier`]: Nested key for a specialized extension subtype
//! - [`Artifact`]: Synthesized composed type with slots and method wrappers
//! - [`ExtensionArtifact`]: Synthesized specialized extension subtype
//! - [`TypeSystem`]: Assignability oracle used by slot matching
//!
//! # Example
//!
//! ```rust,ignore
//! use remix_model::{Artifact, ArtifactHandle, CompositionKey, ExtensionSlot, TypeRef};
//!
//! let key = CompositionKey::new(TypeRef::named("Order"), [TypeRef::named("Audited")]);
//! let artifact = Artifact::new(
//!     key,
//!     ArtifactHandle::new(TypeRef::named("Order$Mixed")),
//!     vec![ExtensionSlot::plain(TypeRef::named("Audited"), 0)],
//! )?;
//! ```

#![warn(unreachable_pub)]

mod artifact;
mod error;
mod key;
mod type_ref;
mod types;

pub use artifact::{
    Artifact, ArtifactHandle, ArtifactId, ArtifactMetadataRecord, ExtensionArtifact,
    ExtensionMetadataRecord, ExtensionSlot, MethodHandle, MethodWrappers,
};
pub use error::ModelError;
pub use key::{CompositionKey, ExtensionIdentifier};
pub use type_ref::TypeRef;
pub use types::{TypeInfo, TypeKind, TypeRegistry, TypeSystem};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
