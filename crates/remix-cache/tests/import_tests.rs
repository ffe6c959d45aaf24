//! Functional tests for importing persisted composition metadata.
//!
//! Core guarantees exercised here:
//! - An imported artifact answers later requests without running the generator.
//! - Import is idempotent and insensitive to candidate order.
//! - Handles without descriptors are skipped; malformed descriptors are
//!   counted and skipped under either policy.
//! - Import never replaces an entry that is already cached.

use remix_cache::{
    ArtifactMetadataImporter, CompositionCache, ImportConfig, ImportReport, JsonDescriptorCodec,
    MalformedDescriptorPolicy,
};
use remix_model::{
    Artifact, ArtifactHandle, ExtensionArtifact, ExtensionIdentifier, ExtensionSlot, TypeRef,
};
use remix_test_utils::{
    init_tracing, key, persisted_extension_handle, persisted_handle, FixtureGenerator,
};
use std::sync::Arc;

/// Artifacts a previous run produced for `Base with [ExtA, ExtB]`
fn previous_run() -> (Artifact, ExtensionArtifact) {
    let k = key("Base", &["ExtA", "ExtB"]);
    let artifact = Artifact::new(
        k.clone(),
        ArtifactHandle::new("Base$Persisted".into()),
        vec![
            ExtensionSlot::plain("ExtA".into(), 0),
            ExtensionSlot::specialized("ExtB".into(), 1),
        ],
    )
    .unwrap();
    let extension = ExtensionArtifact::new(
        ExtensionIdentifier::new(k, "ExtB".into()),
        ArtifactHandle::new("ExtB$Persisted".into()),
        [],
    );
    (artifact, extension)
}

fn persisted() -> Vec<ArtifactHandle> {
    let (artifact, extension) = previous_run();
    vec![
        ArtifactHandle::new("Helper$Closure".into()),
        persisted_handle(&artifact),
        persisted_extension_handle(&extension),
        ArtifactHandle::new("Helper$Thunk".into()),
    ]
}

fn import(handles: Vec<ArtifactHandle>, cache: &CompositionCache) -> ImportReport {
    ArtifactMetadataImporter::new().import(handles, &JsonDescriptorCodec::new(), cache)
}

/// Tenet: import short-circuits generation.
///
/// The whole point of import is to avoid re-synthesis across runs; a request
/// for an imported key must be served from the cache.
#[test]
fn imported_artifact_skips_generator() {
    init_tracing();
    let generator = FixtureGenerator::new().shared();
    let cache = CompositionCache::new(generator.clone());

    let report = import(persisted(), &cache);
    assert_eq!(report.examined, 4);
    assert_eq!(report.compositions_imported, 1);
    assert_eq!(report.extensions_imported, 1);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.malformed, 0);

    let artifact = cache.get_or_create(&key("Base", &["ExtA", "ExtB"])).unwrap();
    assert_eq!(generator.calls(), 0);
    assert_eq!(artifact.produced().produced_type(), &TypeRef::named("Base$Persisted"));
    assert!(artifact.slots()[1].requires_specialized_subtype);

    let id = ExtensionIdentifier::new(key("Base", &["ExtA", "ExtB"]), "ExtB".into());
    let extension = cache.get_or_create_sub_artifact(&id).unwrap();
    assert_eq!(generator.extension_calls(), 0);
    assert_eq!(extension.concrete_type(), &TypeRef::named("ExtB$Persisted"));
}

/// Tenet: repeated import is a no-op.
#[test]
fn import_is_idempotent() {
    let cache = CompositionCache::new(FixtureGenerator::new().shared());

    import(persisted(), &cache);
    let first = cache.get(&key("Base", &["ExtA", "ExtB"])).unwrap();

    let again = import(persisted(), &cache);
    assert_eq!(again.compositions_imported, 0);
    assert_eq!(again.compositions_present, 1);
    assert_eq!(again.extensions_present, 1);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.sub_artifact_count(), 1);
    assert!(Arc::ptr_eq(&first, &cache.get(&key("Base", &["ExtA", "ExtB"])).unwrap()));
}

/// Tenet: candidate order does not change the resulting cache contents.
#[test]
fn import_is_order_insensitive() {
    let forward = CompositionCache::new(FixtureGenerator::new().shared());
    let reversed = CompositionCache::new(FixtureGenerator::new().shared());

    import(persisted(), &forward);
    import(persisted().into_iter().rev().collect(), &reversed);

    let k = key("Base", &["ExtA", "ExtB"]);
    let (a, b) = (forward.get(&k).unwrap(), reversed.get(&k).unwrap());
    assert_eq!(a.slots(), b.slots());
    assert_eq!(a.produced().produced_type(), b.produced().produced_type());
    let id = ExtensionIdentifier::new(k, "ExtB".into());
    assert_eq!(
        forward.get_sub_artifact(&id).unwrap().concrete_type(),
        reversed.get_sub_artifact(&id).unwrap().concrete_type()
    );
}

#[test]
fn handle_carrying_both_descriptors_imports_both() {
    let (artifact, extension) = previous_run();
    let mut handle = persisted_handle(&artifact);
    JsonDescriptorCodec::new()
        .encode_extension(&mut handle, &extension.to_record())
        .unwrap();

    let cache = CompositionCache::new(FixtureGenerator::new().shared());
    let report = import(vec![handle], &cache);

    assert_eq!(report.compositions_imported, 1);
    assert_eq!(report.extensions_imported, 1);
    assert_eq!(report.skipped, 0);
}

#[test]
fn empty_candidate_set_is_noop() {
    let cache = CompositionCache::new(FixtureGenerator::new().shared());
    assert_eq!(import(Vec::new(), &cache), ImportReport::default());
    assert!(cache.is_empty());
}

/// Tenet: a corrupt descriptor never aborts the batch.
#[test]
fn malformed_descriptors_are_skipped_under_both_policies() {
    init_tracing();
    let mut corrupt = ArtifactHandle::new("Broken$Mixed".into());
    corrupt.set_attribute(JsonDescriptorCodec::COMPOSITION_ATTRIBUTE, "{ not json");

    for policy in [MalformedDescriptorPolicy::Skip, MalformedDescriptorPolicy::Warn] {
        let cache = CompositionCache::new(FixtureGenerator::new().shared());
        let mut handles = persisted();
        handles.insert(1, corrupt.clone());

        let report = ArtifactMetadataImporter::with_config(
            ImportConfig::new().with_malformed_policy(policy),
        )
        .import(handles, &JsonDescriptorCodec::new(), &cache);

        assert_eq!(report.malformed, 1, "{policy:?}");
        assert_eq!(report.compositions_imported, 1, "{policy:?}");
        assert_eq!(cache.len(), 1, "{policy:?}");
    }
}

#[test]
fn descriptor_with_inconsistent_slots_is_malformed() {
    let (artifact, _) = previous_run();
    let mut record = artifact.to_record();
    record.slots[1].index = 0;

    let mut handle = ArtifactHandle::new("Base$Persisted".into());
    JsonDescriptorCodec::new()
        .encode_composition(&mut handle, &record)
        .unwrap();

    let cache = CompositionCache::new(FixtureGenerator::new().shared());
    let report = import(vec![handle], &cache);

    assert_eq!(report.malformed, 1);
    assert_eq!(report.skipped, 1);
    assert!(cache.is_empty());
}

/// Tenet: import never overwrites; the first writer wins.
#[test]
fn import_keeps_generated_entry() {
    let generator = FixtureGenerator::new().shared();
    let cache = CompositionCache::new(generator.clone());
    let k = key("Base", &["ExtA", "ExtB"]);

    let generated = cache.get_or_create(&k).unwrap();
    let report = import(persisted(), &cache);

    assert_eq!(report.compositions_present, 1);
    let current = cache.get(&k).unwrap();
    assert!(Arc::ptr_eq(&generated, &current));
    assert_eq!(current.produced().produced_type(), &TypeRef::named("Base$Mixed"));
    assert_eq!(generator.calls(), 1);
}
