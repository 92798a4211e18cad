//! # Kind Registry
//!
//! This module provides the global registry of **entity kinds**: the fixed
//! component composition an entity is built from.
//!
//! ## Purpose
//! A kind descriptor is the compile-time-fixed list of component types that
//! together define what it means to build an entity of that kind. The
//! registry assigns each kind a compact [`KindId`] and makes descriptors
//! available to the submission queue (validation) and grouped storage
//! (column construction).
//!
//! ## Design
//! - A descriptor may mix value-composed and implementor-backed components.
//! - Value-composed slots are ordered **before** implementor slots, so an
//!   implementor view constructed during a build can already observe fully
//!   initialized values.
//! - Descriptors are immutable once registered; the registry is frozen via
//!   [`freeze_definitions`] before the first build.
//!
//! ## Invariants
//! - Every component named by a descriptor is registered.
//! - `KindId` values are unique and stable for the lifetime of the process.

use std::sync::{Arc, OnceLock, RwLock};

use crate::runtime::component::{
    component_description,
    freeze_components,
    ComponentDesc,
    ComponentFlavor,
};
use crate::runtime::types::{build_signature, ComponentId, KindId, Signature, KIND_CAP};


/// Immutable description of an entity kind's component composition.
#[derive(Debug)]
pub struct KindDescriptor {
    /// Runtime identifier assigned to this kind.
    pub kind: KindId,

    /// Human-readable kind name, from the modelling domain.
    pub name: &'static str,

    /// Component specs in allocation order: value-composed slots first,
    /// implementor slots after, each preserving registration call order.
    pub components: Vec<ComponentDesc>,

    /// Bitset over the kind's component ids, used for interest matching.
    pub signature: Signature,
}

impl KindDescriptor {
    /// Returns the number of implementor-backed components.
    pub fn implementor_count(&self) -> usize {
        self.components
            .iter()
            .filter(|desc| desc.flavor == ComponentFlavor::Implementor)
            .count()
    }

    /// Iterates over the implementor-backed component specs, in allocation
    /// order.
    pub fn implementor_specs(&self) -> impl Iterator<Item = &ComponentDesc> {
        self.components
            .iter()
            .filter(|desc| desc.flavor == ComponentFlavor::Implementor)
    }
}

struct KindRegistry {
    kinds: Vec<Arc<KindDescriptor>>,
    frozen: bool,
}

static REGISTRY: OnceLock<RwLock<KindRegistry>> = OnceLock::new();

fn kind_registry() -> &'static RwLock<KindRegistry> {
    REGISTRY.get_or_init(|| RwLock::new(KindRegistry { kinds: Vec::new(), frozen: false }))
}

/// Registers an entity kind composed of the given components and returns
/// its [`KindId`].
///
/// ## Semantics
/// * Component specs are resolved from the component registry; value slots
///   are stably ordered before implementor slots.
/// * Registering the same composition twice produces two distinct kinds;
///   kinds are identities, not structural signatures.
///
/// ## Panics
/// * Panics if the registry is frozen or `KIND_CAP` is exceeded.
/// * Panics if any component id is unregistered (a startup wiring error).
pub fn register_kind(name: &'static str, component_ids: &[ComponentId]) -> KindId {
    let registry = kind_registry();
    let mut registry = registry.write().unwrap();
    assert!(!registry.frozen, "kind registry frozen");
    assert!(registry.kinds.len() < KIND_CAP, "exceeded configured kind capacity");

    let mut components: Vec<ComponentDesc> = component_ids
        .iter()
        .map(|&component_id| {
            component_description(component_id)
                .unwrap_or_else(|| panic!("kind {name} names unregistered component {component_id}"))
        })
        .collect();

    // Value slots allocate first so implementor views observe initialized data.
    components.sort_by_key(|desc| desc.flavor == ComponentFlavor::Implementor);

    let kind = registry.kinds.len() as KindId;
    let signature = build_signature(component_ids);
    registry.kinds.push(Arc::new(KindDescriptor { kind, name, components, signature }));
    kind
}

/// Returns the descriptor for `kind`, if registered.
pub fn kind_descriptor(kind: KindId) -> Option<Arc<KindDescriptor>> {
    let registry = kind_registry();
    let registry = registry.read().unwrap();
    registry.kinds.get(kind as usize).cloned()
}

/// Freezes the component and kind registries.
///
/// ## Purpose
/// Locks component identity, storage factories, and kind composition so the
/// runtime can assume both are complete and stable. Call once after all
/// registrations, before the first build request.
pub fn freeze_definitions() {
    freeze_components();
    let registry = kind_registry();
    let mut registry = registry.write().unwrap();
    registry.frozen = true;
}
