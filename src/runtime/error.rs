//! Error types for entity submission and grouped storage.
//!
//! This module declares focused, composable error types used across the
//! submission queue and the grouped storage layer. Each error carries enough
//! context to make failures actionable while remaining small and cheap to
//! pass around or convert into the aggregate [`ECSError`].
//!
//! ## Goals
//! * **Specificity:** Each error type models a single failure mode (e.g. a
//!   duplicate identity, an unknown removal target, a mismatched implementor
//!   set).
//! * **Ergonomics:** All errors implement [`std::error::Error`] and
//!   [`fmt::Display`], and provide `From<T>` conversions into [`ECSError`].
//! * **Actionability:** Structured fields (the offending identity, expected
//!   vs. supplied counts, expected vs. actual types) make logs useful
//!   without reproducing the issue.
//!
//! ## Typical flow
//! Enqueue operations on the submission queue return [`ECSResult`]; callers
//! use `?` to bubble failures. Every error is a synchronous result of the
//! call that caused it — nothing is deferred to submission time. A failing
//! request is abandoned; the rest of the system continues.
//!
//! ## Display vs. Debug
//! * [`fmt::Display`] is optimized for operator logs (short, imperative
//!   phrasing).
//! * [`fmt::Debug`] (derived) retains full structure for diagnostics.

use std::fmt;
use std::any::TypeId;

use crate::runtime::types::{Egid, KindId};


/// Result alias for fallible runtime operations.
pub type ECSResult<T> = Result<T, ECSError>;

/// Returned when a build request collides with a **live** identity: an
/// entity with the same `(entity, group)` pair already has committed
/// component data, or a group swap would land on an occupied identity.
///
/// ### Fields
/// * `egid` — The identity that is already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateEntityError {
    /// Identity that already has committed component data.
    pub egid: Egid,
}

impl fmt::Display for DuplicateEntityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} already exists", self.egid)
    }
}

impl std::error::Error for DuplicateEntityError {}

/// Returned when a build request collides with a **pending** build queued
/// earlier in the same cycle for the same `(entity, group)` pair.
///
/// The earlier request is unaffected; only the colliding call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateRequestError {
    /// Identity with a build already pending this cycle.
    pub egid: Egid,
}

impl fmt::Display for DuplicateRequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a build for {} is already pending this cycle", self.egid)
    }
}

impl std::error::Error for DuplicateRequestError {}

/// Returned when a removal or group-swap target matches neither a live
/// entity nor a pending build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownEntityError {
    /// Identity that could not be found.
    pub egid: Egid,
}

impl fmt::Display for UnknownEntityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is neither live nor pending", self.egid)
    }
}

impl std::error::Error for UnknownEntityError {}

/// Returned when a build request names a kind that was never registered.
///
/// ## Notes
/// This is a programming error, not a runtime condition: kinds are
/// registered once at startup and frozen before the first build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownKindError {
    /// Offending kind identifier.
    pub kind: KindId,
}

impl fmt::Display for UnknownKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kind {} is not registered", self.kind)
    }
}

impl std::error::Error for UnknownKindError {}

/// Returned when the implementors supplied with a build request do not
/// cover the reference-composed components of the kind's descriptor.
///
/// Every reference-composed component must be backed by exactly one
/// caller-supplied implementor of the registered concrete type.
///
/// ### Fields
/// * `kind` — The kind being built.
/// * `expected` — Number of implementor-backed components in the descriptor.
/// * `supplied` — Number of implementors provided by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImplementorMismatchError {
    /// Kind whose descriptor was not satisfied.
    pub kind: KindId,

    /// Implementor-backed components declared by the descriptor.
    pub expected: usize,

    /// Implementors supplied by the caller.
    pub supplied: usize,
}

impl fmt::Display for ImplementorMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "kind {} requires {} implementor(s); {} supplied or type mismatch",
            self.kind, self.expected, self.supplied
        )
    }
}

impl std::error::Error for ImplementorMismatchError {}

/// Returned when a column write targets a storage slot whose element type
/// does not match the provided value's type.
///
/// This is a logic error surfaced by storage when component type IDs
/// diverge (e.g. writing a velocity value into a position column).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMismatchError {
    /// Destination column's declared element type.
    pub expected: TypeId,

    /// Provided value's dynamic type.
    pub actual: TypeId,
}

impl fmt::Display for TypeMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type mismatch: expected {:?}, actual {:?}", self.expected, self.actual)
    }
}

impl std::error::Error for TypeMismatchError {}

/// Returned when a slot index addresses storage outside valid bounds.
///
/// ## Context
/// Used by column storage to report invalid addressing, typically caused by
/// stale location metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotOutOfBoundsError {
    /// Slot index that was addressed.
    pub slot: usize,

    /// Number of valid slots in the column.
    pub length: usize,
}

impl fmt::Display for SlotOutOfBoundsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot {} out of bounds (length {})", self.slot, self.length)
    }
}

impl std::error::Error for SlotOutOfBoundsError {}

/// Aggregate error for column (dense storage) operations.
///
/// Wraps precise, low-level failures occurring when pushing, removing, or
/// transferring component data between columns. These indicate violated
/// storage invariants rather than recoverable runtime conditions; the
/// scheduler treats them as corruption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// The dynamic type of a value did not match the column element type.
    TypeMismatch(TypeMismatchError),

    /// A slot index addressed storage outside valid bounds.
    SlotOutOfBounds(SlotOutOfBoundsError),

    /// A default value was requested from a column whose element type has
    /// no default (implementor handles must always be caller-supplied).
    ///
    /// The string is the column's element type name.
    DefaultUnsupported(&'static str),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::TypeMismatch(e) => write!(f, "{e}"),
            StorageError::SlotOutOfBounds(e) => write!(f, "{e}"),
            StorageError::DefaultUnsupported(name) => {
                write!(f, "no default value for column of {}", name)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl From<TypeMismatchError> for StorageError {
    fn from(e: TypeMismatchError) -> Self { StorageError::TypeMismatch(e) }
}

impl From<SlotOutOfBoundsError> for StorageError {
    fn from(e: SlotOutOfBoundsError) -> Self { StorageError::SlotOutOfBounds(e) }
}

/// Aggregate error for the runtime's public surface.
///
/// Conversions (`From<T>`) are implemented for each failure mode so callers
/// can write `?` and still return a single, expressive type. All variants
/// are fatal to the failing request, never to the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ECSError {
    /// A build collided with a live identity.
    DuplicateEntity(DuplicateEntityError),

    /// A build collided with a pending build from the same cycle.
    DuplicateRequest(DuplicateRequestError),

    /// A removal or swap target was neither live nor pending.
    UnknownEntity(UnknownEntityError),

    /// A build named a kind that was never registered.
    UnknownKind(UnknownKindError),

    /// Supplied implementors did not satisfy the kind's descriptor.
    ImplementorMismatch(ImplementorMismatchError),

    /// A storage invariant was violated.
    Storage(StorageError),
}

impl fmt::Display for ECSError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ECSError::DuplicateEntity(e) => write!(f, "{e}"),
            ECSError::DuplicateRequest(e) => write!(f, "{e}"),
            ECSError::UnknownEntity(e) => write!(f, "{e}"),
            ECSError::UnknownKind(e) => write!(f, "{e}"),
            ECSError::ImplementorMismatch(e) => write!(f, "{e}"),
            ECSError::Storage(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ECSError {}

impl From<DuplicateEntityError> for ECSError {
    fn from(e: DuplicateEntityError) -> Self { ECSError::DuplicateEntity(e) }
}

impl From<DuplicateRequestError> for ECSError {
    fn from(e: DuplicateRequestError) -> Self { ECSError::DuplicateRequest(e) }
}

impl From<UnknownEntityError> for ECSError {
    fn from(e: UnknownEntityError) -> Self { ECSError::UnknownEntity(e) }
}

impl From<UnknownKindError> for ECSError {
    fn from(e: UnknownKindError) -> Self { ECSError::UnknownKind(e) }
}

impl From<ImplementorMismatchError> for ECSError {
    fn from(e: ImplementorMismatchError) -> Self { ECSError::ImplementorMismatch(e) }
}

impl From<StorageError> for ECSError {
    fn from(e: StorageError) -> Self { ECSError::Storage(e) }
}

impl From<TypeMismatchError> for ECSError {
    fn from(e: TypeMismatchError) -> Self { ECSError::Storage(StorageError::TypeMismatch(e)) }
}

impl From<SlotOutOfBoundsError> for ECSError {
    fn from(e: SlotOutOfBoundsError) -> Self { ECSError::Storage(StorageError::SlotOutOfBounds(e)) }
}
