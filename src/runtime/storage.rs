//! Dense column storage and type-erased access for grouped component data.
//!
//! This module implements the column containers backing grouped storage:
//! [`Column<T>`] stores value-composed component data densely in a single
//! contiguous vector, and [`HandleColumn`] stores the opaque shared handles
//! backing reference-composed components. Both are managed uniformly behind
//! the [`TypeErasedColumn`] trait so a grouped table can hold heterogeneous
//! columns.
//!
//! # Storage model
//!
//! Values are written densely from slot 0 upward, with no gaps. Removal is
//! `swap_remove`: the last element moves into the freed slot and the column
//! shrinks by one. These operations are constant-time and preserve dense
//! packing, but they do **not** preserve element order — callers must never
//! cache a slot index across a removal boundary.
//!
//! # Core operations
//!
//! - **Append**: `push_dyn` inserts a type-checked, type-erased value;
//!   `push_default` default-constructs a value-composed element.
//! - **Remove**: `swap_remove_dyn` deletes an element in `O(1)` and returns
//!   it, so removal notifications can still observe final values.
//! - **Transfer**: `transfer` moves one element into another column of the
//!   same element type, performing swap-remove in the source. This is the
//!   group-relocation primitive.
//!
//! # Type erasure
//!
//! Typed slice access succeeds only when the requested type matches the
//! column's real element type; mismatches surface as `None` or a
//! [`StorageError::TypeMismatch`]. Downcasting back to the concrete column
//! goes through `as_any` / `as_any_mut`.
//!
//! # Invariants
//!
//! - `length()` equals the number of initialized elements.
//! - All slots below `length()` hold valid elements.
//! - A column's element type never changes after construction.

use std::{
    any::{Any, TypeId, type_name},
    sync::Arc,
};

use crate::runtime::error::{
    SlotOutOfBoundsError,
    StorageError,
    TypeMismatchError,
};


/// Opaque shared handle to a caller-owned implementor object.
///
/// The concrete type behind the handle is the component type registered via
/// `register_implementor`; engines recover it by downcasting.
pub type SharedHandle = Arc<dyn Any + Send + Sync>;

/// A type-erased interface for dense component columns.
///
/// Columns implementing this trait store their elements contiguously and
/// maintain these invariants:
///
/// - `length()` returns the number of initialized elements.
/// - All slots in `0..length()` are valid.
/// - `push_dyn` only accepts values whose dynamic type matches the column's
///   element type.
///
/// # Downcasting
/// Implementers return `self` cast to `&dyn Any` / `&mut dyn Any` so callers
/// can attempt a downcast to the concrete column type when typed slice
/// access is required.
pub trait TypeErasedColumn: Any + Send + Sync {
    /// Returns the number of initialized elements stored.
    fn length(&self) -> usize;

    /// Returns an immutable type-erased reference for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns a mutable type-erased reference for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Returns the `TypeId` of the element type stored by this column.
    fn element_type_id(&self) -> TypeId;

    /// Returns the human-readable name of the element type stored.
    fn element_type_name(&self) -> &'static str;

    /// Reserves capacity for at least `additional` further elements.
    fn reserve(&mut self, additional: usize);

    /// Appends a type-erased value to the column.
    fn push_dyn(&mut self, value: Box<dyn Any + Send>) -> Result<(), StorageError>;

    /// Appends a default-constructed element.
    ///
    /// Fails with [`StorageError::DefaultUnsupported`] on columns whose
    /// element type has no default (implementor handles).
    fn push_default(&mut self) -> Result<(), StorageError>;

    /// Removes the element at `slot` using swap-remove and returns it.
    ///
    /// The survivor that previously occupied the last slot, if any, now
    /// occupies `slot`; the caller is responsible for fixing up location
    /// metadata.
    fn swap_remove_dyn(&mut self, slot: usize) -> Result<Box<dyn Any + Send>, StorageError>;

    /// Moves the element at `slot` into `destination`, which must be a
    /// column of the same element type. Swap-remove semantics apply to the
    /// source.
    fn transfer(
        &mut self,
        destination: &mut dyn TypeErasedColumn,
        slot: usize,
    ) -> Result<(), StorageError>;
}

/// Dense storage for a single value-composed component type.
pub struct Column<T> {
    values: Vec<T>,
}

impl<T> Default for Column<T> {
    fn default() -> Self {
        Self { values: Vec::new() }
    }
}

impl<T: 'static + Send + Sync> Column<T> {
    /// Returns the dense values as an immutable slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    /// Returns the dense values as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Returns the element at `slot`, if in bounds.
    #[inline]
    pub fn get(&self, slot: usize) -> Option<&T> {
        self.values.get(slot)
    }

    /// Appends a typed value.
    #[inline]
    pub fn push(&mut self, value: T) {
        self.values.push(value);
    }

    fn check_slot(&self, slot: usize) -> Result<(), StorageError> {
        if slot >= self.values.len() {
            return Err(SlotOutOfBoundsError { slot, length: self.values.len() }.into());
        }
        Ok(())
    }
}

impl<T: 'static + Send + Sync + Default> TypeErasedColumn for Column<T> {
    fn length(&self) -> usize { self.values.len() }

    fn as_any(&self) -> &dyn Any { self }

    fn as_any_mut(&mut self) -> &mut dyn Any { self }

    fn element_type_id(&self) -> TypeId { TypeId::of::<T>() }

    fn element_type_name(&self) -> &'static str { type_name::<T>() }

    fn reserve(&mut self, additional: usize) {
        self.values.reserve(additional);
    }

    fn push_dyn(&mut self, value: Box<dyn Any + Send>) -> Result<(), StorageError> {
        match value.downcast::<T>() {
            Ok(typed) => {
                self.values.push(*typed);
                Ok(())
            }
            Err(value) => Err(TypeMismatchError {
                expected: TypeId::of::<T>(),
                actual: value.as_ref().type_id(),
            }
            .into()),
        }
    }

    fn push_default(&mut self) -> Result<(), StorageError> {
        self.values.push(T::default());
        Ok(())
    }

    fn swap_remove_dyn(&mut self, slot: usize) -> Result<Box<dyn Any + Send>, StorageError> {
        self.check_slot(slot)?;
        Ok(Box::new(self.values.swap_remove(slot)))
    }

    fn transfer(
        &mut self,
        destination: &mut dyn TypeErasedColumn,
        slot: usize,
    ) -> Result<(), StorageError> {
        self.check_slot(slot)?;
        let actual = destination.element_type_id();
        let destination = destination
            .as_any_mut()
            .downcast_mut::<Column<T>>()
            .ok_or(TypeMismatchError {
                expected: TypeId::of::<T>(),
                actual,
            })?;

        let value = self.values.swap_remove(slot);
        destination.values.push(value);
        Ok(())
    }
}

/// Dense storage for the shared handles backing one reference-composed
/// component type.
#[derive(Default)]
pub struct HandleColumn {
    handles: Vec<SharedHandle>,
}

impl HandleColumn {
    /// Returns a clone of the handle at `slot`, if in bounds.
    #[inline]
    pub fn handle_at(&self, slot: usize) -> Option<SharedHandle> {
        self.handles.get(slot).cloned()
    }

    /// Appends a handle.
    #[inline]
    pub fn push(&mut self, handle: SharedHandle) {
        self.handles.push(handle);
    }

    fn check_slot(&self, slot: usize) -> Result<(), StorageError> {
        if slot >= self.handles.len() {
            return Err(SlotOutOfBoundsError { slot, length: self.handles.len() }.into());
        }
        Ok(())
    }
}

impl TypeErasedColumn for HandleColumn {
    fn length(&self) -> usize { self.handles.len() }

    fn as_any(&self) -> &dyn Any { self }

    fn as_any_mut(&mut self) -> &mut dyn Any { self }

    fn element_type_id(&self) -> TypeId { TypeId::of::<SharedHandle>() }

    fn element_type_name(&self) -> &'static str { "implementor handle" }

    fn reserve(&mut self, additional: usize) {
        self.handles.reserve(additional);
    }

    fn push_dyn(&mut self, value: Box<dyn Any + Send>) -> Result<(), StorageError> {
        match value.downcast::<SharedHandle>() {
            Ok(handle) => {
                self.handles.push(*handle);
                Ok(())
            }
            Err(value) => Err(TypeMismatchError {
                expected: TypeId::of::<SharedHandle>(),
                actual: value.as_ref().type_id(),
            }
            .into()),
        }
    }

    fn push_default(&mut self) -> Result<(), StorageError> {
        Err(StorageError::DefaultUnsupported("implementor handle"))
    }

    fn swap_remove_dyn(&mut self, slot: usize) -> Result<Box<dyn Any + Send>, StorageError> {
        self.check_slot(slot)?;
        Ok(Box::new(self.handles.swap_remove(slot)))
    }

    fn transfer(
        &mut self,
        destination: &mut dyn TypeErasedColumn,
        slot: usize,
    ) -> Result<(), StorageError> {
        self.check_slot(slot)?;
        let actual = destination.element_type_id();
        let destination = destination
            .as_any_mut()
            .downcast_mut::<HandleColumn>()
            .ok_or(TypeMismatchError {
                expected: TypeId::of::<SharedHandle>(),
                actual,
            })?;

        let handle = self.handles.swap_remove(slot);
        destination.handles.push(handle);
        Ok(())
    }
}
