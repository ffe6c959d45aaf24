//! Artifact descriptor decoding
//!
//! A previously synthesized artifact can carry a base-composition descriptor,
//! an extension-composition descriptor, both, or neither. How descriptors are
//! embedded is up to the decoder; [`JsonDescriptorCodec`] is a reference
//! encoding that stores them as JSON in handle attributes.

use remix_model::{ArtifactHandle, ArtifactMetadataRecord, ExtensionMetadataRecord};

/// Result of probing a handle for one kind of descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorOutcome<T> {
    /// Handle carries no such descriptor
    Absent,

    /// Descriptor decoded successfully
    Decoded(T),

    /// Descriptor present but unreadable
    Malformed(String),
}

impl<T> DescriptorOutcome<T> {
    /// Decoded value, if any
    #[inline]
    pub fn decoded(self) -> Option<T> {
        match self {
            Self::Decoded(value) => Some(value),
            Self::Absent | Self::Malformed(_) => None,
        }
    }
}

/// Recovers composition metadata from synthesized artifacts
///
/// # Contract
/// `decode(encode(x))` must reproduce the composition key, slots and
/// method-wrapper pairs exactly.
pub trait ArtifactDescriptorDecoder {
    /// Probe for a base-composition descriptor
    fn composition_descriptor(
        &self,
        handle: &ArtifactHandle,
    ) -> DescriptorOutcome<ArtifactMetadataRecord>;

    /// Probe for an extension-composition descriptor
    fn extension_descriptor(
        &self,
        handle: &ArtifactHandle,
    ) -> DescriptorOutcome<ExtensionMetadataRecord>;
}

/// Reference codec storing descriptors as JSON handle attributes
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDescriptorCodec;

impl JsonDescriptorCodec {
    /// Attribute holding the base-composition descriptor
    pub const COMPOSITION_ATTRIBUTE: &'static str = "remix.composition";

    /// Attribute holding the extension-composition descriptor
    pub const EXTENSION_ATTRIBUTE: &'static str = "remix.extension";

    /// Create codec
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Embed base-composition descriptor into `handle`
    ///
    /// # Errors
    /// Returns error if the record cannot be serialized
    pub fn encode_composition(
        &self,
        handle: &mut ArtifactHandle,
        record: &ArtifactMetadataRecord,
    ) -> Result<(), serde_json::Error> {
        let encoded = serde_json::to_string(record)?;
        handle.set_attribute(Self::COMPOSITION_ATTRIBUTE, encoded);
        Ok(())
    }

    /// Embed extension-composition descriptor into `handle`
    ///
    /// # Errors
    /// Returns error if the record cannot be serialized
    pub fn encode_extension(
        &self,
        handle: &mut ArtifactHandle,
        record: &ExtensionMetadataRecord,
    ) -> Result<(), serde_json::Error> {
        let encoded = serde_json::to_string(record)?;
        handle.set_attribute(Self::EXTENSION_ATTRIBUTE, encoded);
        Ok(())
    }

    fn decode<T: serde::de::DeserializeOwned>(
        handle: &ArtifactHandle,
        attribute: &str,
    ) -> DescriptorOutcome<T> {
        match handle.attribute(attribute) {
            None => DescriptorOutcome::Absent,
            Some(raw) => match serde_json::from_str(raw) {
                Ok(record) => DescriptorOutcome::Decoded(record),
                Err(e) => DescriptorOutcome::Malformed(format!("{attribute}: {e}")),
            },
        }
    }
}

impl ArtifactDescriptorDecoder for JsonDescriptorCodec {
    fn composition_descriptor(
        &self,
        handle: &ArtifactHandle,
    ) -> DescriptorOutcome<ArtifactMetadataRecord> {
        Self::decode(handle, Self::COMPOSITION_ATTRIBUTE)
    }

    fn extension_descriptor(
        &self,
        handle: &ArtifactHandle,
    ) -> DescriptorOutcome<ExtensionMetadataRecord> {
        Self::decode(handle, Self::EXTENSION_ATTRIBUTE)
    }
}
