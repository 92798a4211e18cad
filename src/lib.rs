//! # Grouped ECS Runtime
//!
//! Entity-component runtime built around three ideas:
//!
//! - **Deferred submission** — producers queue entity builds, removals, and
//!   group swaps from arbitrary code paths; changes apply only at explicit
//!   submission points, so live iteration state is never corrupted.
//! - **Grouped dense storage** — component data is packed contiguously per
//!   group for cache-friendly bulk processing, with an O(1) location index.
//! - **Engine notification** — consumers declare component interest and are
//!   told exactly once when a matching entity appears or disappears.
//!
//! ## Design Goals
//! - Domain-agnostic storage and notification infrastructure
//! - Host-controlled submission cadence
//! - Cooperative, registration-ordered engine driving
//! - Safe, explicit data access through narrow handles

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_inception)]

pub mod runtime;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (Public API)
// ─────────────────────────────────────────────────────────────────────────────

// Core runtime types

pub use runtime::root::{
    ECSRoot,
    EntityQueries,
    EntityRequests,
    TickReport,
};

pub use runtime::types::{
    build_signature,
    ComponentId,
    Egid,
    EntityId,
    GroupId,
    KindId,
    Signature,
    ValueSet,
    GROUP_DEFAULT,
};

pub use runtime::component::{
    component_id_of,
    register_component,
    register_implementor,
    ComponentDesc,
    ComponentFlavor,
};

pub use runtime::descriptor::{
    freeze_definitions,
    kind_descriptor,
    register_kind,
    KindDescriptor,
};

pub use runtime::engine::{Engine, EngineStatus, FnEngine};
pub use runtime::scheduler::{SchedulerPhase, SubmitStats};
pub use runtime::storage::SharedHandle;
pub use runtime::view::EntityView;

pub use runtime::error::{
    DuplicateEntityError,
    DuplicateRequestError,
    ECSError,
    ECSResult,
    ImplementorMismatchError,
    StorageError,
    UnknownEntityError,
    UnknownKindError,
};

// ─────────────────────────────────────────────────────────────────────────────
// Prelude (Optional but recommended)
// ─────────────────────────────────────────────────────────────────────────────

/// Commonly used runtime types.
///
/// Import with:
/// ```rust
/// use ecs_runtime::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        build_signature,
        component_id_of,
        freeze_definitions,
        register_component,
        register_implementor,
        register_kind,
        ECSRoot,
        Egid,
        Engine,
        EngineStatus,
        EntityQueries,
        EntityRequests,
        EntityView,
        Signature,
        ValueSet,
        GROUP_DEFAULT,
    };
}
