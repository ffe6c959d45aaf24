//! Testing utilities for Remix workspace
//!
//! Shared fixtures: a deterministic generator, a small type universe and
//! helpers to "persist" artifacts the way a previous run would have.

#![allow(missing_docs)]

use remix_cache::{
    CompositionCache, GeneratedComposition, GenerationError, Generator, JsonDescriptorCodec,
};
use remix_model::{
    Artifact, ArtifactHandle, CompositionKey, ExtensionArtifact, ExtensionIdentifier,
    ExtensionSlot, MethodHandle, TypeInfo, TypeRef, TypeRegistry,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};

/// Install a fmt subscriber honouring `RUST_LOG`; safe to call repeatedly
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A tracing event recorded by [`EventCapture`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedEvent {
    pub level: Level,
    pub message: String,
}

/// Layer that records every event's level and message
#[derive(Debug, Clone, Default)]
pub struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl EventCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().clone()
    }

    pub fn count_at(&self, level: Level) -> usize {
        self.events.lock().iter().filter(|e| e.level == level).count()
    }
}

struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}

impl<S: Subscriber> tracing_subscriber::Layer<S> for EventCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor {
            message: String::new(),
        };
        event.record(&mut visitor);
        self.events.lock().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.message,
        });
    }
}

/// Run `f` with a thread-local subscriber that captures every event it emits
pub fn capture_events<R>(f: impl FnOnce() -> R) -> (R, EventCapture) {
    let capture = EventCapture::new();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, capture)
}

pub fn key(base: &str, extensions: &[&str]) -> CompositionKey {
    CompositionKey::new(
        TypeRef::named(base),
        extensions.iter().map(|e| TypeRef::named(*e)),
    )
}

pub fn produced_type_for(key: &CompositionKey) -> TypeRef {
    TypeRef::named(format!("{}$Mixed", key.base()))
}

/// Base, ExtA, ExtB, ExtB_Derived (: ExtB), IShared, Counter (value), NeedsArgs (no ctor)
pub fn fixture_types() -> Arc<TypeRegistry> {
    let types = TypeRegistry::new();
    for name in ["Base", "Other", "ExtA", "ExtB", "IShared"] {
        types.register(TypeInfo::class(name.into())).unwrap();
    }
    types
        .register(TypeInfo::class("ExtB_Derived".into()).derives("ExtB".into()))
        .unwrap();
    types
        .register(TypeInfo::class("SharedA".into()).implements("IShared".into()))
        .unwrap();
    types
        .register(TypeInfo::class("SharedB".into()).implements("IShared".into()))
        .unwrap();
    types.register(TypeInfo::value("Counter".into())).unwrap();
    types
        .register(TypeInfo::class("NeedsArgs".into()).without_default_constructor())
        .unwrap();
    Arc::new(types)
}

/// Deterministic generator
///
/// Produces `<Base>$Mixed` with one slot per extension. Extensions listed via
/// [`FixtureGenerator::with_specialization`] get specialized slots and a
/// matching extension artifact.
#[derive(Debug, Default)]
pub struct FixtureGenerator {
    calls: AtomicUsize,
    extension_calls: AtomicUsize,
    specializations: HashMap<TypeRef, TypeRef>,
    failing_bases: HashSet<TypeRef>,
    types: Option<Arc<TypeRegistry>>,
    delay: Duration,
}

impl FixtureGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_specialization(mut self, declared: &str, derived: &str) -> Self {
        self.specializations
            .insert(TypeRef::named(declared), TypeRef::named(derived));
        self
    }

    /// Register produced composed types as subtypes of their base
    pub fn with_types(mut self, types: Arc<TypeRegistry>) -> Self {
        self.types = Some(types);
        self
    }

    pub fn failing_on(mut self, base: &str) -> Self {
        self.failing_bases.insert(TypeRef::named(base));
        self
    }

    /// Sleep inside every generation to widen race windows
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn extension_calls(&self) -> usize {
        self.extension_calls.load(Ordering::SeqCst)
    }

    fn extension_artifact(&self, id: &ExtensionIdentifier) -> Option<ExtensionArtifact> {
        let derived = self.specializations.get(id.extension())?;
        Some(ExtensionArtifact::new(
            id.clone(),
            ArtifactHandle::new(derived.clone()),
            [(
                MethodHandle::new(id.extension().clone(), "invoke"),
                MethodHandle::new(derived.clone(), "__wrap_invoke"),
            )],
        ))
    }
}

impl Generator for FixtureGenerator {
    fn generate(
        &self,
        key: &CompositionKey,
        _cache: &CompositionCache,
    ) -> Result<GeneratedComposition, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if self.failing_bases.contains(key.base()) {
            return Err(GenerationError::synthesis(format!("fixture failure for {key}")));
        }

        let produced = produced_type_for(key);
        let slots = key
            .extensions()
            .iter()
            .enumerate()
            .map(|(i, ext)| {
                if self.specializations.contains_key(ext) {
                    ExtensionSlot::specialized(ext.clone(), i)
                } else {
                    ExtensionSlot::plain(ext.clone(), i)
                }
            })
            .collect();
        let wrappers: Vec<_> = key
            .extensions()
            .iter()
            .map(|ext| {
                (
                    MethodHandle::new(ext.clone(), "invoke"),
                    MethodHandle::new(produced.clone(), format!("__wrap_{}_invoke", ext.name())),
                )
            })
            .collect();

        if let Some(types) = &self.types {
            if types.contains(key.base()) && !types.contains(&produced) {
                types
                    .register(TypeInfo::class(produced.clone()).derives(key.base().clone()))
                    .map_err(|e| GenerationError::synthesis(e.to_string()))?;
            }
        }

        let artifact = Artifact::new(key.clone(), ArtifactHandle::new(produced), slots)
            .map_err(|e| GenerationError::synthesis(e.to_string()))?
            .with_method_wrappers(wrappers);

        let mut generated = GeneratedComposition::new(artifact);
        for ext in key.extensions() {
            let id = ExtensionIdentifier::new(key.clone(), ext.clone());
            if let Some(extension) = self.extension_artifact(&id) {
                generated = generated.with_extension_artifact(extension);
            }
        }
        Ok(generated)
    }

    fn generate_extension(
        &self,
        id: &ExtensionIdentifier,
        _cache: &CompositionCache,
    ) -> Result<ExtensionArtifact, GenerationError> {
        self.extension_calls.fetch_add(1, Ordering::SeqCst);
        self.extension_artifact(id)
            .ok_or_else(|| GenerationError::Unsupported(format!("no specialization for {id}")))
    }
}

/// Handle carrying `artifact`'s composition descriptor
pub fn persisted_handle(artifact: &Artifact) -> ArtifactHandle {
    let mut handle = artifact.produced().clone();
    JsonDescriptorCodec::new()
        .encode_composition(&mut handle, &artifact.to_record())
        .unwrap();
    handle
}

/// Handle carrying `extension`'s extension descriptor
pub fn persisted_extension_handle(extension: &ExtensionArtifact) -> ArtifactHandle {
    let mut handle = extension.produced().clone();
    JsonDescriptorCodec::new()
        .encode_extension(&mut handle, &extension.to_record())
        .unwrap();
    handle
}
