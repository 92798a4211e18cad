//! Grouped storage and the location index.
//!
//! This module owns all committed component data. Storage is partitioned by
//! **group**, then by **kind**: every `(group, kind)` pair maps to a
//! [`KindTable`] holding one dense column per component of the kind, all
//! columns slot-aligned with a shared owner list.
//!
//! ## Responsibilities
//! * Allocate an entity's full component set in one step, value slots
//!   first, so later-constructed implementor views observe initialized
//!   data.
//! * Release entities via swap-remove, returning the released component
//!   values so removal notifications can still read them.
//! * Relocate entities between groups, preserving component values.
//! * Serve zero-copy dense slices to the query surface.
//! * Maintain the location index: a global `Egid → kind` live map plus a
//!   per-table `entity → slot` map, updated incrementally on every
//!   structural change.
//!
//! ## Invariants
//! * Within one table, `entities`, `slots`, and every column agree on
//!   length and slot assignment.
//! * An entity id appears at most once per group, across all kinds.
//! * Slot order is not stable across removals: swap-remove moves the last
//!   survivor into the freed slot and the index is fixed up immediately.
//!
//! ## Concurrency
//! `GroupedStorage` is exclusively owned by the runtime root and mutated
//! only at submission points on the driving thread. Nothing here is
//! internally synchronized.

use std::any::Any;
use std::collections::HashMap;

use crate::runtime::component::{make_empty_column, ComponentDesc, ComponentFlavor};
use crate::runtime::descriptor::{kind_descriptor, KindDescriptor};
use crate::runtime::error::{
    DuplicateEntityError,
    ECSResult,
    ImplementorMismatchError,
    UnknownEntityError,
    UnknownKindError,
};
use crate::runtime::component::component_id_of;
use crate::runtime::storage::{Column, HandleColumn, SharedHandle, TypeErasedColumn};
use crate::runtime::types::{ComponentId, Egid, EntityId, GroupId, KindId, ValueSet};


/// One dense column of a kind table, tagged with its component spec.
struct ColumnEntry {
    desc: ComponentDesc,
    column: Box<dyn TypeErasedColumn>,
}

/// Dense storage for all entities of one kind within one group.
///
/// All columns are slot-aligned: the entity at owner-list position `i` owns
/// slot `i` of every column.
pub struct KindTable {
    entities: Vec<EntityId>,
    slots: HashMap<EntityId, usize>,
    columns: Vec<ColumnEntry>,
}

impl KindTable {
    fn new(descriptor: &KindDescriptor) -> Self {
        let columns = descriptor
            .components
            .iter()
            .map(|desc| ColumnEntry {
                desc: *desc,
                column: make_empty_column(desc.component_id),
            })
            .collect();

        Self {
            entities: Vec::new(),
            slots: HashMap::new(),
            columns,
        }
    }

    /// Returns the number of live entities in this table.
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if no entity of this kind lives in the group.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Returns the owner list: slot index → entity id.
    #[inline]
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Resolves an entity to its current slot.
    #[inline]
    pub fn slot_of(&self, entity: EntityId) -> Option<usize> {
        self.slots.get(&entity).copied()
    }

    fn column(&self, component_id: ComponentId) -> Option<&dyn TypeErasedColumn> {
        self.columns
            .iter()
            .find(|entry| entry.desc.component_id == component_id)
            .map(|entry| entry.column.as_ref())
    }

    fn column_mut(&mut self, component_id: ComponentId) -> Option<&mut dyn TypeErasedColumn> {
        self.columns
            .iter_mut()
            .find(|entry| entry.desc.component_id == component_id)
            .map(|entry| entry.column.as_mut())
    }

    /// Removes `slot` from the owner list and fixes up the survivor's
    /// location, mirroring the swap-remove already applied to the columns.
    fn swap_remove_owner(&mut self, slot: usize) {
        self.entities.swap_remove(slot);
        if slot < self.entities.len() {
            let moved = self.entities[slot];
            self.slots.insert(moved, slot);
        }
    }
}

/// The component values released by removing one entity, buffered so removal
/// notifications can still observe them after the slot was reclaimed.
pub struct ReleasedEntity {
    components: Vec<(ComponentId, Box<dyn Any + Send>)>,
}

impl ReleasedEntity {
    pub(crate) fn get(&self, component_id: ComponentId) -> Option<&(dyn Any + Send)> {
        self.components
            .iter()
            .find(|(cid, _)| *cid == component_id)
            .map(|(_, value)| value.as_ref())
    }
}

/// All committed component data, partitioned by group and kind, plus the
/// location index.
pub struct GroupedStorage {
    groups: HashMap<GroupId, HashMap<KindId, KindTable>>,
    live: HashMap<Egid, KindId>,
}

impl GroupedStorage {
    /// Creates empty storage. Tables are created lazily as kinds first
    /// appear in a group.
    pub fn new() -> Self {
        Self {
            groups: HashMap::new(),
            live: HashMap::new(),
        }
    }

    /// Returns `true` if `egid` has committed component data.
    #[inline]
    pub fn contains(&self, egid: Egid) -> bool {
        self.live.contains_key(&egid)
    }

    /// Returns the kind of a live entity.
    #[inline]
    pub fn kind_of(&self, egid: Egid) -> Option<KindId> {
        self.live.get(&egid).copied()
    }

    /// Returns the number of live entities across all groups.
    #[inline]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    fn table(&self, kind: KindId, group: GroupId) -> Option<&KindTable> {
        self.groups.get(&group).and_then(|kinds| kinds.get(&kind))
    }

    fn table_mut(&mut self, kind: KindId, group: GroupId) -> Option<&mut KindTable> {
        self.groups.get_mut(&group).and_then(|kinds| kinds.get_mut(&kind))
    }

    /// Commits an entity's full component set and returns its slot.
    ///
    /// ## Semantics
    /// * Fails with `DuplicateEntity` if `egid` is already present.
    /// * Value-composed components take their explicit value from `values`
    ///   when present, otherwise the type's default.
    /// * Implementor-backed components take the supplied handle whose
    ///   concrete type matches the registered component type.
    ///
    /// ## Ordering
    /// Columns fill in descriptor order — value slots first — so an
    /// implementor reading its entity's values during construction observes
    /// fully initialized data.
    pub fn allocate(
        &mut self,
        kind: KindId,
        egid: Egid,
        values: &mut ValueSet,
        implementors: &[SharedHandle],
    ) -> ECSResult<usize> {
        if self.live.contains_key(&egid) {
            return Err(DuplicateEntityError { egid }.into());
        }

        let descriptor = kind_descriptor(kind).ok_or(UnknownKindError { kind })?;
        let table = self
            .groups
            .entry(egid.group())
            .or_default()
            .entry(kind)
            .or_insert_with(|| KindTable::new(&descriptor));

        for entry in table.columns.iter_mut() {
            match entry.desc.flavor {
                ComponentFlavor::Value => match values.take(entry.desc.component_id) {
                    Some(value) => entry.column.push_dyn(value)?,
                    None => entry.column.push_default()?,
                },
                ComponentFlavor::Implementor => {
                    let handle = implementors
                        .iter()
                        .find(|handle| (***handle).type_id() == entry.desc.type_id)
                        .cloned()
                        .ok_or(ImplementorMismatchError {
                            kind,
                            expected: descriptor.implementor_count(),
                            supplied: implementors.len(),
                        })?;
                    entry.column.push_dyn(Box::new(handle))?;
                }
            }
        }

        let slot = table.entities.len();
        table.entities.push(egid.entity());
        table.slots.insert(egid.entity(), slot);
        self.live.insert(egid, kind);
        Ok(slot)
    }

    /// Reclaims an entity's slot and returns its released component values.
    ///
    /// Implemented as swap-with-last plus truncation on every column; the
    /// survivor that occupied the last slot moves into the freed slot and
    /// the location index is fixed up. Any raw slot index held across this
    /// call is stale.
    pub fn release(&mut self, egid: Egid) -> ECSResult<(KindId, ReleasedEntity)> {
        let kind = *self
            .live
            .get(&egid)
            .ok_or(UnknownEntityError { egid })?;

        let table = self
            .table_mut(kind, egid.group())
            .ok_or(UnknownEntityError { egid })?;
        let slot = table
            .slots
            .remove(&egid.entity())
            .ok_or(UnknownEntityError { egid })?;

        let mut components = Vec::with_capacity(table.columns.len());
        for entry in table.columns.iter_mut() {
            let value = entry.column.swap_remove_dyn(slot)?;
            components.push((entry.desc.component_id, value));
        }

        table.swap_remove_owner(slot);
        self.live.remove(&egid);
        Ok((kind, ReleasedEntity { components }))
    }

    /// Moves an entity between groups, preserving component values, and
    /// returns its kind and new slot.
    ///
    /// Semantically a release from the source followed by an allocate into
    /// the destination, performed as a direct column-to-column transfer.
    pub fn relocate(
        &mut self,
        entity: EntityId,
        from: GroupId,
        to: GroupId,
    ) -> ECSResult<(KindId, usize)> {
        let source_egid = Egid::new(entity, from);
        let target_egid = Egid::new(entity, to);

        let kind = *self
            .live
            .get(&source_egid)
            .ok_or(UnknownEntityError { egid: source_egid })?;
        if self.live.contains_key(&target_egid) {
            return Err(DuplicateEntityError { egid: target_egid }.into());
        }

        let descriptor = kind_descriptor(kind).ok_or(UnknownKindError { kind })?;
        let slot = self
            .table(kind, from)
            .and_then(|table| table.slot_of(entity))
            .ok_or(UnknownEntityError { egid: source_egid })?;

        // The source table is lifted out so source and destination can be
        // borrowed at once; it is reinserted below.
        let mut source = self
            .groups
            .get_mut(&from)
            .and_then(|kinds| kinds.remove(&kind))
            .ok_or(UnknownEntityError { egid: source_egid })?;

        let destination = self
            .groups
            .entry(to)
            .or_default()
            .entry(kind)
            .or_insert_with(|| KindTable::new(&descriptor));

        let mut transfer_result: ECSResult<()> = Ok(());
        for (source_entry, destination_entry) in
            source.columns.iter_mut().zip(destination.columns.iter_mut())
        {
            if let Err(error) = source_entry
                .column
                .transfer(destination_entry.column.as_mut(), slot)
            {
                transfer_result = Err(error.into());
                break;
            }
        }

        if transfer_result.is_ok() {
            let new_slot = destination.entities.len();
            destination.entities.push(entity);
            destination.slots.insert(entity, new_slot);

            source.slots.remove(&entity);
            source.swap_remove_owner(slot);

            self.live.remove(&source_egid);
            self.live.insert(target_egid, kind);
        }

        self.groups
            .entry(from)
            .or_default()
            .insert(kind, source);

        transfer_result.map(|_| {
            let table = self
                .table(kind, to)
                .expect("destination table disappeared during relocate");
            (kind, table.len() - 1)
        })
    }

    /// Returns the dense values of component `T` for `(kind, group)`.
    ///
    /// A group with no entities of the kind yields an empty slice, never an
    /// error.
    pub fn query_slice<T: 'static + Send + Sync + Default>(
        &self,
        kind: KindId,
        group: GroupId,
    ) -> &[T] {
        self.table(kind, group)
            .and_then(|table| table.column(component_id_of::<T>()))
            .and_then(|column| column.as_any().downcast_ref::<Column<T>>())
            .map(|column| column.as_slice())
            .unwrap_or_default()
    }

    /// Returns the dense values of component `T` for `(kind, group)` as a
    /// mutable slice for in-place bulk updates.
    pub fn query_slice_mut<T: 'static + Send + Sync + Default>(
        &mut self,
        kind: KindId,
        group: GroupId,
    ) -> &mut [T] {
        let component_id = component_id_of::<T>();
        self.table_mut(kind, group)
            .and_then(|table| table.column_mut(component_id))
            .and_then(|column| column.as_any_mut().downcast_mut::<Column<T>>())
            .map(|column| column.as_mut_slice())
            .unwrap_or_default()
    }

    /// Returns the owner list for `(kind, group)`: slot index → entity id,
    /// aligned with every dense slice of the same table.
    pub fn entities(&self, kind: KindId, group: GroupId) -> &[EntityId] {
        self.table(kind, group)
            .map(|table| table.entities())
            .unwrap_or(&[])
    }

    /// Reads one entity's value-composed component.
    pub fn value<T: 'static + Send + Sync + Default>(&self, egid: Egid) -> Option<&T> {
        let kind = self.kind_of(egid)?;
        let table = self.table(kind, egid.group())?;
        let slot = table.slot_of(egid.entity())?;
        table
            .column(component_id_of::<T>())?
            .as_any()
            .downcast_ref::<Column<T>>()?
            .get(slot)
    }

    /// Returns the implementor handle backing one entity's
    /// reference-composed component, downcast to its concrete type.
    pub fn shared<T: Any + Send + Sync>(&self, egid: Egid) -> Option<std::sync::Arc<T>> {
        let kind = self.kind_of(egid)?;
        let table = self.table(kind, egid.group())?;
        let slot = table.slot_of(egid.entity())?;
        let handle = table
            .column(component_id_of::<T>())?
            .as_any()
            .downcast_ref::<HandleColumn>()?
            .handle_at(slot)?;
        handle.downcast::<T>().ok()
    }

    /// Reserves backing storage for a burst of builds of `kind` into
    /// `group`. Performance hint only; no correctness effect if omitted.
    pub fn preallocate(&mut self, kind: KindId, group: GroupId, capacity: usize) -> ECSResult<()> {
        let descriptor = kind_descriptor(kind).ok_or(UnknownKindError { kind })?;
        let table = self
            .groups
            .entry(group)
            .or_default()
            .entry(kind)
            .or_insert_with(|| KindTable::new(&descriptor));

        table.entities.reserve(capacity);
        table.slots.reserve(capacity);
        for entry in table.columns.iter_mut() {
            entry.column.reserve(capacity);
        }
        Ok(())
    }
}

impl Default for GroupedStorage {
    fn default() -> Self {
        Self::new()
    }
}
