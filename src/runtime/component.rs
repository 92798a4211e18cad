//! # Component Registry
//!
//! This module provides a global registry that assigns stable [`ComponentId`]
//! values to Rust component types and exposes type-erased storage factories
//! for dense column allocation.
//!
//! ## Purpose
//! The registry decouples component type information (`TypeId`, name, flavor)
//! from runtime storage, enabling grouped tables to store heterogeneous
//! component columns behind `TypeErasedColumn`.
//!
//! ## Design
//! - Components are registered once and assigned a compact `ComponentId` in
//!   `[0, COMPONENT_CAP)`.
//! - Each component records its **flavor**: a value-composed component is a
//!   plain datum owned by storage and default-constructed when no explicit
//!   value is supplied; a reference-composed component is backed by a
//!   caller-owned implementor object stored as an opaque shared handle.
//! - A per-component factory function is stored for constructing empty
//!   column storage.
//! - The registry can be frozen to prevent further registrations after
//!   startup.
//!
//! ## Invariants
//! - `ComponentId` values are unique and stable for the lifetime of the
//!   process.
//! - A registered component always has a corresponding storage factory.
//! - When frozen, registration is disallowed.
//!
//! ## Concurrency
//! The registry is protected by `RwLock` for concurrent reads and serialized
//! writes. Registration is expected to happen during startup only.

use std::{
    any::{TypeId, type_name},
    sync::{OnceLock, RwLock},
    collections::HashMap,
};

use crate::runtime::storage::{Column, HandleColumn, TypeErasedColumn};
use crate::runtime::types::{ComponentId, COMPONENT_CAP};


/// Storage strategy backing a component type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ComponentFlavor {
    /// Plain datum stored inline in the dense column; default-constructed
    /// when the build request carries no explicit value.
    Value,

    /// Caller-owned implementor object, stored as an opaque shared handle.
    Implementor,
}

/// Factory function for constructing an empty type-erased component column.
type ColumnFactory = fn() -> Box<dyn TypeErasedColumn>;

fn new_value_column<T: 'static + Send + Sync + Default>() -> Box<dyn TypeErasedColumn> {
    Box::new(Column::<T>::default())
}

fn new_handle_column() -> Box<dyn TypeErasedColumn> {
    Box::new(HandleColumn::default())
}

/// Describes a registered component type.
///
/// ## Fields
/// - `component_id`: The runtime identifier assigned by the registry.
/// - `name`: The Rust type name (`type_name::<T>()`).
/// - `type_id`: The runtime `TypeId` for the component.
/// - `flavor`: The storage strategy backing the component.
///
/// ## Notes
/// `ComponentDesc` is `Copy` and safe to clone freely for diagnostics.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ComponentDesc {
    /// Runtime identifier assigned to this component type.
    pub component_id: ComponentId,

    /// Rust type name for diagnostics.
    pub name: &'static str,

    /// Runtime `TypeId` of the component.
    pub type_id: TypeId,

    /// Storage strategy backing this component.
    pub flavor: ComponentFlavor,
}

impl std::fmt::Display for ComponentDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ComponentDesc {{ id: {}, name: {}, flavor: {:?} }}",
            self.component_id, self.name, self.flavor
        )
    }
}

/// Global mapping between Rust component types and compact `ComponentId`
/// values.
///
/// ## Invariants
/// - Every entry in `by_type` has a matching `by_id[id]` and `factories[id]`.
/// - IDs are always in bounds of `COMPONENT_CAP`.
pub struct ComponentRegistry {
    next_id: ComponentId,
    by_type: HashMap<TypeId, ComponentId>,
    by_id: Vec<Option<ComponentDesc>>,
    factories: Vec<Option<ColumnFactory>>,
    frozen: bool,
}

static REGISTRY: OnceLock<RwLock<ComponentRegistry>> = OnceLock::new();

fn component_registry() -> &'static RwLock<ComponentRegistry> {
    REGISTRY.get_or_init(|| {
        RwLock::new(ComponentRegistry {
            next_id: 0 as ComponentId,
            by_type: HashMap::new(),
            by_id: vec![None; COMPONENT_CAP],
            factories: vec![None; COMPONENT_CAP],
            frozen: false,
        })
    })
}

impl ComponentRegistry {

    /// Allocates a new `ComponentId`.
    ///
    /// ## Panics
    /// Panics if `COMPONENT_CAP` is exceeded.
    fn alloc_id(&mut self) -> ComponentId {
        let component_id = self.next_id;
        assert!((component_id as usize) < COMPONENT_CAP, "exceeded configured component capacity");
        self.next_id = component_id.wrapping_add(1);
        component_id
    }

    fn register(
        &mut self,
        type_id: TypeId,
        name: &'static str,
        flavor: ComponentFlavor,
        factory: ColumnFactory,
    ) -> ComponentId {
        if let Some(&existing) = self.by_type.get(&type_id) {
            let desc = self.by_id[existing as usize]
                .as_ref()
                .expect("registered component must have a descriptor");
            assert!(
                desc.flavor == flavor,
                "component {} registered twice with different flavors",
                name
            );
            return existing;
        }

        assert!(!self.frozen, "component registry frozen");
        let id = self.alloc_id();
        self.by_type.insert(type_id, id);
        self.by_id[id as usize] = Some(ComponentDesc { component_id: id, name, type_id, flavor });
        self.factories[id as usize] = Some(factory);
        id
    }

    /// Freezes the registry, preventing further component registrations.
    pub fn freeze(&mut self) { self.frozen = true; }

    /// Returns `true` if the registry has been frozen.
    pub fn is_frozen(&self) -> bool { self.frozen }

    /// Returns the `ComponentId` associated with a `TypeId`, if registered.
    pub fn component_id_of_type_id(&self, type_id: TypeId) -> Option<ComponentId> {
        self.by_type.get(&type_id).copied()
    }

    /// Returns the component descriptor for a `ComponentId`, if registered.
    pub fn description_by_component_id(&self, component_id: ComponentId) -> Option<&ComponentDesc> {
        self.by_id.get(component_id as usize).and_then(|o| o.as_ref())
    }
}

/// Registers `T` as a value-composed component and returns its
/// [`ComponentId`].
///
/// ## Purpose
/// Associates a plain-data Rust type with a stable runtime identifier and
/// installs the dense-column factory used to allocate grouped storage for
/// this type. Values are stored inline and default-constructed when a build
/// request carries no explicit value.
///
/// ## Behavior
/// - If `T` is already registered, returns the existing ID.
///
/// ## Panics
/// - Panics if the registry is frozen or capacity is exceeded.
/// - Panics if `T` was previously registered as an implementor-backed
///   component.
pub fn register_component<T: 'static + Send + Sync + Default>() -> ComponentId {
    let registry = component_registry();
    let mut registry = registry.write().unwrap();
    registry.register(
        TypeId::of::<T>(),
        type_name::<T>(),
        ComponentFlavor::Value,
        new_value_column::<T>,
    )
}

/// Registers `T` as a reference-composed component and returns its
/// [`ComponentId`].
///
/// ## Purpose
/// `T` is the concrete implementor type callers supply at build time. The
/// runtime stores one shared handle per entity; the handle is matched to
/// this component by its concrete `TypeId`.
///
/// ## Panics
/// Same conditions as [`register_component`].
pub fn register_implementor<T: 'static + Send + Sync>() -> ComponentId {
    let registry = component_registry();
    let mut registry = registry.write().unwrap();
    registry.register(
        TypeId::of::<T>(),
        type_name::<T>(),
        ComponentFlavor::Implementor,
        new_handle_column,
    )
}

/// Freezes the global component registry.
///
/// ## Purpose
/// Prevents any further component registration, making component IDs and
/// storage factories stable for grouped-table construction.
pub fn freeze_components() {
    let registry = component_registry();
    let mut registry = registry.write().unwrap();
    registry.freeze();
}

/// Returns the registered `ComponentId` for type `T`.
///
/// ## Panics
/// Panics if `T` is not registered.
pub fn component_id_of<T: 'static>() -> ComponentId {
    let registry = component_registry();
    let registry = registry.read().unwrap();
    registry
        .component_id_of_type_id(TypeId::of::<T>())
        .expect("component not registered")
}

/// Returns the `ComponentId` associated with a runtime `TypeId`, if
/// registered.
pub fn component_id_of_type_id(type_id: TypeId) -> Option<ComponentId> {
    let registry = component_registry();
    let registry = registry.read().unwrap();
    registry.component_id_of_type_id(type_id)
}

/// Returns a copy of the descriptor for `component_id`, if registered.
pub fn component_description(component_id: ComponentId) -> Option<ComponentDesc> {
    let registry = component_registry();
    let registry = registry.read().unwrap();
    registry.description_by_component_id(component_id).cloned()
}

/// Creates an empty type-erased storage column for `component_id`.
///
/// ## Purpose
/// Used by grouped-table construction to allocate an empty column for a
/// component.
///
/// ## Panics
/// Panics if no factory exists for the provided ID.
pub fn make_empty_column(component_id: ComponentId) -> Box<dyn TypeErasedColumn> {
    let registry = component_registry();
    let registry = registry.read().unwrap();
    let factory = registry.factories[component_id as usize]
        .expect("no factory registered for this component id");
    factory()
}
