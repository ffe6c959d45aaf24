//! Remix Instance Composition
//!
//! Wires extension instances into the slots of a composed artifact.
//!
//! # Core Concepts
//!
//! - [`InstanceCompositionInitializer`]: Builds and validates extension arrays
//! - [`Instance`]: Type-erased runtime object with a known runtime type
//! - [`InstanceFactory`] / [`ObjectConstructor`]: Construction collaborators
//! - [`MixinConfiguration`]: Explicit base type -> extensions configuration
//! - [`Composer`]: Full pipeline from requested type to composed object
//!
//! # Example
//!
//! ```rust,ignore
//! use remix_compose::{Composer, MixinConfiguration, PlainObject};
//!
//! let configuration = MixinConfiguration::new()
//!     .with_mixin("Order", "Audited")
//!     .with_mixin("Order", "Versioned");
//!
//! let order = composer.new_object(
//!     &configuration,
//!     &"Order".into(),
//!     &[PlainObject::shared("Audited")],
//! )?;
//! ```

#![warn(unreachable_pub)]

mod composer;
mod config;
mod constructor;
mod error;
mod initializer;
mod instance;

pub use composer::{Composer, ComposerConfig, ConfigurationResolver, MixinConfiguration};
pub use config::{ConfigError, RemixConfig};
pub use constructor::{DefaultObjectConstructor, InstanceFactory, ObjectConstructor};
pub use error::{CompositionError, CompositionResult};
pub use initializer::{InstanceCompositionInitializer, ResolvedSlot};
pub use instance::{ComposedObject, Instance, InstanceRef, PlainObject};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
