//! Artifact metadata import
//!
//! Pre-populates a [`CompositionCache`] from artifacts synthesized in a prior
//! run so matching requests skip the generator. Import runs over an arbitrary
//! closure of previously produced artifacts; most of them are helpers without
//! any descriptor and are skipped.
//!
//! Import is idempotent and order-insensitive because the cache never
//! overwrites. Run it before concurrent `get_or_create` traffic starts,
//! otherwise generation may race ahead of import and do redundant work.

use crate::cache::CompositionCache;
use crate::config::{ImportConfig, MalformedDescriptorPolicy};
use crate::descriptor::{ArtifactDescriptorDecoder, DescriptorOutcome};
use remix_model::{Artifact, ArtifactHandle, ExtensionArtifact};

/// Summary of one import batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Handles examined
    pub examined: usize,
    /// Base artifacts inserted
    pub compositions_imported: usize,
    /// Base descriptors whose key was already cached
    pub compositions_present: usize,
    /// Extension artifacts inserted
    pub extensions_imported: usize,
    /// Extension descriptors whose identifier was already cached
    pub extensions_present: usize,
    /// Handles carrying no usable descriptor
    pub skipped: usize,
    /// Descriptors that were present but unreadable
    pub malformed: usize,
}

/// Imports persisted composition metadata into a cache
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtifactMetadataImporter {
    config: ImportConfig,
}

impl ArtifactMetadataImporter {
    /// Create importer with default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create importer with explicit configuration
    #[inline]
    #[must_use]
    pub fn with_config(config: ImportConfig) -> Self {
        Self { config }
    }

    /// Import every recognizable descriptor from `candidates` into `cache`
    ///
    /// Never fails: handles without descriptors are skipped, malformed
    /// descriptors are skipped according to [`ImportConfig::malformed`].
    pub fn import<I, D>(&self, candidates: I, decoder: &D, cache: &CompositionCache) -> ImportReport
    where
        I: IntoIterator<Item = ArtifactHandle>,
        D: ArtifactDescriptorDecoder + ?Sized,
    {
        let mut report = ImportReport::default();

        for handle in candidates {
            report.examined += 1;
            let mut recognized = false;

            match decoder.composition_descriptor(&handle) {
                DescriptorOutcome::Absent => {}
                DescriptorOutcome::Malformed(reason) => {
                    self.malformed(&handle, &reason, &mut report);
                }
                DescriptorOutcome::Decoded(record) => {
                    match Artifact::from_record(handle.clone(), record) {
                        Ok(artifact) => {
                            recognized = true;
                            if cache.populate(artifact) {
                                report.compositions_imported += 1;
                            } else {
                                report.compositions_present += 1;
                            }
                        }
                        Err(e) => self.malformed(&handle, &e.to_string(), &mut report),
                    }
                }
            }

            match decoder.extension_descriptor(&handle) {
                DescriptorOutcome::Absent => {}
                DescriptorOutcome::Malformed(reason) => {
                    self.malformed(&handle, &reason, &mut report);
                }
                DescriptorOutcome::Decoded(record) => {
                    recognized = true;
                    let extension = ExtensionArtifact::from_record(handle.clone(), record);
                    if cache.populate_sub_artifact(extension) {
                        report.extensions_imported += 1;
                    } else {
                        report.extensions_present += 1;
                    }
                }
            }

            if !recognized {
                report.skipped += 1;
            }
        }

        tracing::debug!(
            examined = report.examined,
            compositions = report.compositions_imported,
            extensions = report.extensions_imported,
            skipped = report.skipped,
            malformed = report.malformed,
            "artifact metadata import finished"
        );
        report
    }

    fn malformed(&self, handle: &ArtifactHandle, reason: &str, report: &mut ImportReport) {
        report.malformed += 1;
        match self.config.malformed {
            MalformedDescriptorPolicy::Skip => {}
            MalformedDescriptorPolicy::Warn => tracing::warn!(
                artifact = %handle.id(),
                produced = %handle.produced_type(),
                reason,
                "skipping malformed composition descriptor"
            ),
        }
    }
}
