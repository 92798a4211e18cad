//! # Submission Queue
//!
//! This module defines the deferred request buffer producers write into.
//!
//! ## Purpose
//! Structural changes — builds, removals, group swaps — are never applied
//! to grouped storage directly. Producers enqueue plain-data requests; the
//! scheduler drains and applies them at an explicit synchronization point.
//! This is what lets an engine request removal or a group swap of the very
//! entity it was just notified about without corrupting live iteration.
//!
//! ## Validation
//! Every enqueue operation validates synchronously against the **visible
//! identity mirror**: the set of identities that are live or have a build
//! pending this cycle. The mirror is updated eagerly at enqueue time to
//! reflect the state the world will have once the queue is applied, so a
//! producer immediately learns about duplicate identities or unknown
//! targets — nothing is deferred to submission time.
//!
//! ## Same-cycle netting
//! A build followed in the same cycle by a remove of the same
//! `(entity, group)` pair nets to a no-op at the queue level: the build is
//! cancelled and the remove is never recorded, so consumers observe neither
//! an add nor a remove. Netting is exact-pair only — a group swap in
//! between breaks the pair and all requests apply in FIFO enqueue order.
//!
//! ## Invariants
//! - Requests are applied in the order they were recorded.
//! - A drain takes a consistent snapshot; requests enqueued while the
//!   snapshot is being applied land in the next cycle's batch.

use std::collections::HashMap;

use crate::runtime::descriptor::kind_descriptor;
use crate::runtime::error::{
    DuplicateEntityError,
    DuplicateRequestError,
    ECSResult,
    ImplementorMismatchError,
    UnknownEntityError,
    UnknownKindError,
};
use crate::runtime::storage::SharedHandle;
use crate::runtime::types::{Egid, EntityId, GroupId, KindId, ValueSet};


/// A deferred structural request.
///
/// Requests are plain data describing *what* change should occur, not
/// *how*. They are created by producer calls, live only inside the queue,
/// and are consumed exactly once when the scheduler drains.
pub(crate) enum Request {
    /// Commit a new entity's component set.
    Build {
        /// Kind to build.
        kind: KindId,
        /// Identity the entity will have.
        egid: Egid,
        /// Explicit initial values for value-composed components.
        values: ValueSet,
        /// Caller-supplied implementor handles.
        implementors: Vec<SharedHandle>,
        /// Set when a same-cycle remove netted this build out.
        cancelled: bool,
    },

    /// Reclaim an entity's component data.
    Remove {
        /// Identity to remove.
        egid: Egid,
    },

    /// Move an entity between groups, preserving component values.
    Swap {
        /// Entity to move.
        entity: EntityId,
        /// Group it currently lives in.
        from: GroupId,
        /// Group it will live in.
        to: GroupId,
    },
}

/// Provenance of a visible identity.
#[derive(Clone, Copy)]
enum Visible {
    /// Committed to storage in an earlier cycle.
    Live,

    /// Created by a build pending in the current batch. `build_index`
    /// addresses the originating build request while the identity is still
    /// eligible for same-cycle netting; a group swap clears it.
    Pending { build_index: Option<usize> },
}

/// FIFO buffer of deferred requests plus the visible identity mirror.
pub(crate) struct SubmissionQueue {
    requests: Vec<Request>,
    visible: HashMap<Egid, Visible>,
}

impl SubmissionQueue {
    pub(crate) fn new() -> Self {
        Self {
            requests: Vec::new(),
            visible: HashMap::new(),
        }
    }

    /// Records a build request.
    ///
    /// Fails with `UnknownKind` for an unregistered kind,
    /// `ImplementorMismatch` when the supplied implementors do not cover the
    /// descriptor's reference-composed slots, `DuplicateRequest` when a
    /// build for the same identity is already pending, and
    /// `DuplicateEntity` when the identity is live.
    pub(crate) fn enqueue_build(
        &mut self,
        kind: KindId,
        egid: Egid,
        values: ValueSet,
        implementors: Vec<SharedHandle>,
    ) -> ECSResult<()> {
        let descriptor = kind_descriptor(kind).ok_or(UnknownKindError { kind })?;

        let expected = descriptor.implementor_count();
        let covered = descriptor.implementor_specs().all(|spec| {
            implementors
                .iter()
                .any(|handle| (**handle).type_id() == spec.type_id)
        });
        if implementors.len() != expected || !covered {
            return Err(ImplementorMismatchError {
                kind,
                expected,
                supplied: implementors.len(),
            }
            .into());
        }

        match self.visible.get(&egid) {
            Some(Visible::Live) => return Err(DuplicateEntityError { egid }.into()),
            Some(Visible::Pending { .. }) => return Err(DuplicateRequestError { egid }.into()),
            None => {}
        }

        let build_index = self.requests.len();
        self.requests.push(Request::Build {
            kind,
            egid,
            values,
            implementors,
            cancelled: false,
        });
        self.visible
            .insert(egid, Visible::Pending { build_index: Some(build_index) });
        Ok(())
    }

    /// Records a remove request, or nets out a same-cycle build.
    ///
    /// Fails with `UnknownEntity` when the target is neither live nor
    /// pending.
    pub(crate) fn enqueue_remove(&mut self, egid: Egid) -> ECSResult<()> {
        match self.visible.get(&egid) {
            None => Err(UnknownEntityError { egid }.into()),
            Some(Visible::Pending { build_index: Some(index) }) => {
                // Entity created and destroyed within one cycle: invisible
                // to consumers, neither add nor remove fires.
                let index = *index;
                if let Request::Build { cancelled, .. } = &mut self.requests[index] {
                    *cancelled = true;
                }
                self.visible.remove(&egid);
                Ok(())
            }
            Some(Visible::Pending { build_index: None }) | Some(Visible::Live) => {
                self.requests.push(Request::Remove { egid });
                self.visible.remove(&egid);
                Ok(())
            }
        }
    }

    /// Records a group-swap request.
    ///
    /// Fails with `UnknownEntity` when `(entity, from)` is neither live nor
    /// pending, and with `DuplicateEntity` when `(entity, to)` is already
    /// occupied.
    pub(crate) fn enqueue_swap(
        &mut self,
        entity: EntityId,
        from: GroupId,
        to: GroupId,
    ) -> ECSResult<()> {
        let source = Egid::new(entity, from);
        let target = Egid::new(entity, to);

        if !self.visible.contains_key(&source) {
            return Err(UnknownEntityError { egid: source }.into());
        }
        if self.visible.contains_key(&target) {
            return Err(DuplicateEntityError { egid: target }.into());
        }

        self.requests.push(Request::Swap { entity, from, to });

        let origin = self
            .visible
            .remove(&source)
            .expect("source visibility checked above");
        let relocated = match origin {
            Visible::Live => Visible::Live,
            // The build/remove netting pair is broken by the move.
            Visible::Pending { .. } => Visible::Pending { build_index: None },
        };
        self.visible.insert(target, relocated);
        Ok(())
    }

    /// Takes the current batch, clearing the queue.
    ///
    /// Pending identities are promoted to live: by the time the returned
    /// batch has been applied, every one of them has committed data, and
    /// enqueues issued during notification dispatch must validate against
    /// that state.
    pub(crate) fn drain(&mut self) -> Vec<Request> {
        for visible in self.visible.values_mut() {
            *visible = Visible::Live;
        }
        std::mem::take(&mut self.requests)
    }

    /// Number of requests waiting in the current batch.
    pub(crate) fn pending_len(&self) -> usize {
        self.requests.len()
    }
}
