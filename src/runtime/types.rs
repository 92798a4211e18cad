//! Core Identifiers, Bit-Level Layouts, and Signatures
//!
//! This module defines the **fundamental types, identifiers, bit layouts, and
//! signatures** shared by every subsystem of the runtime: grouped storage,
//! the submission queue, the scheduler, the notifier, and the query surface.
//!
//! ## Design Philosophy
//!
//! The runtime is designed around:
//!
//! - **Grouped dense storage**
//! - **Bitset-based component signatures**
//! - **Stable numeric identifiers**
//! - **Deferred structural mutation**
//!
//! To support these goals efficiently, this module:
//!
//! - Encodes an entity's grouped identity into a single 64-bit value,
//! - Represents component sets as fixed-size bit arrays,
//! - Uses small, copyable numeric IDs for all runtime concepts,
//! - Avoids heap allocation in hot paths.
//!
//! ## Grouped Identity
//!
//! Entities are addressed by an [`Egid`]: an entity id paired with the group
//! it currently lives in, packed as:
//!
//! ```text
//! | group | entity |
//! ```
//!
//! The entity id is unique among live entities *within one group*; the same
//! numeric id may exist in different groups at the same time. Entities that
//! are never grouped implicitly live in [`GROUP_DEFAULT`].
//!
//! The exact bit widths are controlled by compile-time constants and
//! validated using static assertions.
//!
//! ## Kinds and Components
//!
//! Component types are identified by compact [`ComponentId`] values assigned
//! by the component registry. Entity kinds are described by [`Signature`]
//! bitsets indicating which components they are composed of.
//!
//! Signatures:
//!
//! - are fixed-size arrays of `u64`,
//! - support fast subset tests (the notifier's interest match),
//! - allow efficient iteration over set bits.
//!
//! ## Safety and Performance
//!
//! This module contains **no unsafe code**, but its types are relied on at
//! every storage boundary. Correctness here is critical to overall runtime
//! soundness.

use std::any::Any;
use std::fmt;

use crate::runtime::component::component_id_of;


/// Bit-width type used for compile-time layout calculations.
pub type Bits = u8;

/// Identifier for an entity within a group.
pub type EntityId = u32;
/// Identifier for a storage group.
pub type GroupId = u32;
/// Identifier for a registered entity kind.
pub type KindId = u16;
/// Identifier for a registered component type.
pub type ComponentId = u16;

/// The implicit group for entities built without an explicit group.
pub const GROUP_DEFAULT: GroupId = 0;

/// Total number of bits in a packed [`Egid`].
pub const EGID_BITS: Bits = 64;
/// Number of bits reserved for the group identifier.
pub const GROUP_BITS: Bits = 32;
/// Number of bits reserved for the entity identifier.
pub const ENTITY_BITS: Bits = EGID_BITS - GROUP_BITS;

const _: [(); 1] = [(); (GROUP_BITS < EGID_BITS) as usize];
const _: [(); 1] = [(); (ENTITY_BITS > 0) as usize];
const _: [(); 1] = [(); (GROUP_BITS + ENTITY_BITS == EGID_BITS) as usize];

const fn mask(bits: Bits) -> u64 {
    if bits == 0 { 0 } else { (1u64 << bits) - 1 }
}

/// Mask selecting the entity portion of a packed [`Egid`].
pub const ENTITY_MASK: u64 = mask(ENTITY_BITS);
/// Mask selecting the group portion of a packed [`Egid`].
pub const GROUP_MASK: u64 = mask(GROUP_BITS);

/// Maximum number of registered component types.
pub const COMPONENT_CAP: usize = 1024;
/// Number of `u64` words required to represent a full component signature.
pub const SIGNATURE_SIZE: usize = (COMPONENT_CAP + 63) / 64;
/// Maximum number of registered entity kinds.
pub const KIND_CAP: usize = 1024;

/// Grouped entity identifier packed as a 64-bit value.
///
/// The pair `(entity, group)` is the only way to locate component data.
/// Two `Egid`s with the same entity id but different groups denote distinct
/// identities.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Egid(pub u64);

#[inline]
const fn make_egid(entity: EntityId, group: GroupId) -> u64 {
    ((group as u64) << ENTITY_BITS) | (entity as u64)
}

#[inline]
const fn split_egid(egid: Egid) -> (EntityId, GroupId) {
    let id = egid.0;
    let entity = (id & ENTITY_MASK) as EntityId;
    let group = ((id >> ENTITY_BITS) & GROUP_MASK) as GroupId;
    (entity, group)
}

impl Egid {
    /// Packs an entity id and a group id into a grouped identity.
    #[inline]
    pub const fn new(entity: EntityId, group: GroupId) -> Self {
        Egid(make_egid(entity, group))
    }

    /// Packs an entity id into the default group.
    #[inline]
    pub const fn ungrouped(entity: EntityId) -> Self {
        Egid::new(entity, GROUP_DEFAULT)
    }

    /// Returns the `(entity, group)` pair.
    #[inline] pub const fn pair(self) -> (EntityId, GroupId) { split_egid(self) }
    /// Returns the entity portion of this identity.
    #[inline] pub const fn entity(self) -> EntityId { (self.0 & ENTITY_MASK) as EntityId }
    /// Returns the group portion of this identity.
    #[inline] pub const fn group(self) -> GroupId { ((self.0 >> ENTITY_BITS) & GROUP_MASK) as GroupId }

    /// Returns this identity re-addressed under another group.
    ///
    /// This does not move any data; it only produces the identity the entity
    /// would have after a group swap.
    #[inline]
    pub const fn in_group(self, group: GroupId) -> Self {
        Egid::new(self.entity(), group)
    }
}

impl fmt::Display for Egid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity {} in group {}", self.entity(), self.group())
    }
}

/// Bitset representing a set of component types.
#[derive(Clone, Copy, Debug)]
pub struct Signature {
    /// Packed component bitset.
    pub components: [u64; SIGNATURE_SIZE],
}

impl Default for Signature {
    fn default() -> Self {
        Self {
            components: [0u64; SIGNATURE_SIZE],
        }
    }
}

impl Signature {
    /// Sets the bit corresponding to `component_id`.
    #[inline]
    pub fn set(&mut self, component_id: ComponentId) {
        let index = (component_id as usize) / 64;
        let bits = (component_id as usize) % 64;
        self.components[index] |= 1u64 << bits;
    }

    /// Clears the bit corresponding to `component_id`.
    #[inline]
    pub fn clear(&mut self, component_id: ComponentId) {
        let index = (component_id as usize) / 64;
        let bits = (component_id as usize) % 64;
        self.components[index] &= !(1u64 << bits);
    }

    /// Returns `true` if `component_id` is present in this signature.
    #[inline]
    pub fn has(&self, component_id: ComponentId) -> bool {
        let index = (component_id as usize) / 64;
        let bits = (component_id as usize) % 64;
        (self.components[index] >> bits) & 1 == 1
    }

    /// Returns `true` if no component bit is set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.iter().all(|&word| word == 0)
    }

    /// Returns `true` if all components in `signature` are present.
    #[inline]
    pub fn contains_all(&self, signature: &Signature) -> bool {
        for (word_a, word_b) in self.components.iter().zip(signature.components.iter()) {
            if (word_a & word_b) != *word_b { return false; }
        }
        true
    }

    /// Iterates over all component IDs set in this signature.
    pub fn iter_component_ids(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.components
            .iter()
            .enumerate()
            .flat_map(|(word_index, &word)| {
                let base = word_index * 64;
                let mut bits = word;
                std::iter::from_fn(move || {
                    if bits == 0 {
                        return None;
                    }
                    let tz = bits.trailing_zeros() as usize;
                    bits &= bits - 1;
                    Some((base + tz) as ComponentId)
                })
            })
    }
}

/// Builds a component signature from a list of component IDs.
pub fn build_signature(component_ids: &[ComponentId]) -> Signature {
    let mut signature = Signature::default();
    for &component_id in component_ids { signature.set(component_id); }
    signature
}

/// Type-erased set of explicit initial component values for a build request.
///
/// A `ValueSet` carries caller-supplied starting values for value-composed
/// components. Components of the kind that are absent from the set are
/// default-constructed when the build is applied.
pub struct ValueSet {
    /// Component presence signature.
    signature: Signature,
    /// Sparse storage of component values.
    values: Vec<(ComponentId, Box<dyn Any + Send>)>,
}

impl ValueSet {
    /// Creates an empty value set.
    #[inline]
    pub fn new() -> Self {
        Self {
            signature: Signature::default(),
            values: Vec::new(),
        }
    }

    /// Inserts an explicit initial value for component type `T`.
    ///
    /// ## Panics
    /// Panics if `T` is not a registered component type.
    #[inline]
    pub fn insert<T: Any + Send>(&mut self, value: T) {
        let component_id = component_id_of::<T>();
        self.signature.set(component_id);
        self.values.push((component_id, Box::new(value)));
    }

    /// Removes and returns the value for `component_id`, if present.
    #[inline]
    pub(crate) fn take(&mut self, component_id: ComponentId) -> Option<Box<dyn Any + Send>> {
        let index = self
            .values
            .iter()
            .position(|(cid, _)| *cid == component_id)?;

        let (_, value) = self.values.swap_remove(index);
        self.signature.clear(component_id);
        Some(value)
    }

    /// Returns `true` if no explicit values are present.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Builds a signature representing the components present in this set.
    #[inline]
    pub fn signature(&self) -> Signature {
        self.signature
    }
}

impl Default for ValueSet {
    fn default() -> Self { Self::new() }
}
