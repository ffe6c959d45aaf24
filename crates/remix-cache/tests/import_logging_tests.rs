//! Logging behavior of the malformed-descriptor policies.
//!
//! Both policies count and skip a malformed descriptor; they differ only in
//! what is logged:
//! - `Skip` emits no warning
//! - `Warn` emits exactly one warning per malformed descriptor

use remix_cache::{
    ArtifactMetadataImporter, CompositionCache, ImportConfig, ImportReport, JsonDescriptorCodec,
    MalformedDescriptorPolicy,
};
use remix_model::ArtifactHandle;
use remix_test_utils::{capture_events, EventCapture, FixtureGenerator};
use tracing::Level;

/// One corrupt handle between two handles without descriptors
fn candidates() -> Vec<ArtifactHandle> {
    let mut corrupt = ArtifactHandle::new("Broken$Mixed".into());
    corrupt.set_attribute(JsonDescriptorCodec::COMPOSITION_ATTRIBUTE, "{ not json");
    vec![
        ArtifactHandle::new("Helper$Closure".into()),
        corrupt,
        ArtifactHandle::new("Helper$Thunk".into()),
    ]
}

fn import_with(policy: MalformedDescriptorPolicy) -> (ImportReport, EventCapture) {
    let cache = CompositionCache::new(FixtureGenerator::new().shared());
    let importer =
        ArtifactMetadataImporter::with_config(ImportConfig::new().with_malformed_policy(policy));
    capture_events(|| importer.import(candidates(), &JsonDescriptorCodec::new(), &cache))
}

/// Tenet: the default policy is silent.
#[test]
fn skip_policy_emits_no_warning() {
    let (report, capture) = import_with(MalformedDescriptorPolicy::Skip);

    assert_eq!(report.malformed, 1);
    assert_eq!(capture.count_at(Level::WARN), 0);
}

/// Tenet: the warn policy reports each malformed descriptor once.
#[test]
fn warn_policy_emits_one_warning_per_malformed_descriptor() {
    let (report, capture) = import_with(MalformedDescriptorPolicy::Warn);

    assert_eq!(report.malformed, 1);
    let warnings: Vec<_> = capture
        .events()
        .into_iter()
        .filter(|e| e.level == Level::WARN)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].message, "skipping malformed composition descriptor");
}

#[test]
fn absent_descriptors_never_warn() {
    let handles = vec![ArtifactHandle::new("Helper$Closure".into())];
    let cache = CompositionCache::new(FixtureGenerator::new().shared());
    let importer = ArtifactMetadataImporter::with_config(
        ImportConfig::new().with_malformed_policy(MalformedDescriptorPolicy::Warn),
    );

    let (report, capture) =
        capture_events(|| importer.import(handles, &JsonDescriptorCodec::new(), &cache));

    assert_eq!(report.skipped, 1);
    assert_eq!(capture.count_at(Level::WARN), 0);
}
