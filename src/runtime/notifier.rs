//! Engine notification dispatch.
//!
//! ## Purpose
//! Walks the structural changes applied by a submission cycle and invokes
//! the add/remove callbacks of every interested engine, exactly once per
//! change, in application order, engines in registration order.
//!
//! ## Interest matching
//! An engine is interested in a change when its declared component
//! signature is a non-empty subset of the changed entity's kind signature.
//!
//! ## Views
//! * Adds are dispatched over live storage — the entity's full component
//!   set is already committed.
//! * Removes are dispatched over the component values buffered when the
//!   slot was released, so callbacks still observe final data.
//! * A group swap dispatches, per interested engine, a remove presented
//!   under the source group followed by an add under the destination group.

use tracing::trace;

use crate::runtime::descriptor::kind_descriptor;
use crate::runtime::engine::Engine;
use crate::runtime::group::{GroupedStorage, ReleasedEntity};
use crate::runtime::root::EntityRequests;
use crate::runtime::types::{Egid, EntityId, GroupId, KindId};
use crate::runtime::view::EntityView;


/// One structural change applied to grouped storage, in application order.
pub(crate) enum AppliedChange {
    /// A build committed an entity's component set.
    Added {
        egid: Egid,
        kind: KindId,
    },

    /// A removal reclaimed an entity's slot; its final component values are
    /// buffered for the callbacks.
    Removed {
        egid: Egid,
        kind: KindId,
        released: ReleasedEntity,
    },

    /// A group swap relocated an entity's component data.
    Swapped {
        entity: EntityId,
        kind: KindId,
        from: GroupId,
        to: GroupId,
    },
}

impl AppliedChange {
    fn kind(&self) -> KindId {
        match self {
            AppliedChange::Added { kind, .. }
            | AppliedChange::Removed { kind, .. }
            | AppliedChange::Swapped { kind, .. } => *kind,
        }
    }
}

/// Dispatches every applied change to every interested engine.
///
/// Returns the number of callbacks invoked.
pub(crate) fn dispatch_changes(
    engines: &mut [Box<dyn Engine>],
    storage: &GroupedStorage,
    requests: &EntityRequests,
    changes: &[AppliedChange],
) -> usize {
    let mut notifications = 0;

    for change in changes {
        let kind = change.kind();
        let Some(descriptor) = kind_descriptor(kind) else {
            debug_assert!(false, "applied change references unregistered kind {kind}");
            continue;
        };

        for engine in engines.iter_mut() {
            let interest = engine.interest();
            if interest.is_empty() || !descriptor.signature.contains_all(&interest) {
                continue;
            }

            match change {
                AppliedChange::Added { egid, kind } => {
                    trace!(engine = engine.name(), %egid, "on_add");
                    engine.on_add(EntityView::live(storage, *egid, *egid, *kind), requests);
                    notifications += 1;
                }
                AppliedChange::Removed { egid, kind, released } => {
                    trace!(engine = engine.name(), %egid, "on_remove");
                    engine.on_remove(EntityView::released(released, *egid, *kind), requests);
                    notifications += 1;
                }
                AppliedChange::Swapped { entity, kind, from, to } => {
                    let source = Egid::new(*entity, *from);
                    let destination = Egid::new(*entity, *to);

                    trace!(engine = engine.name(), %source, %destination, "swap dispatch");
                    engine.on_remove(
                        EntityView::live(storage, source, destination, *kind),
                        requests,
                    );
                    engine.on_add(
                        EntityView::live(storage, destination, destination, *kind),
                        requests,
                    );
                    notifications += 2;
                }
            }
        }
    }

    notifications
}
