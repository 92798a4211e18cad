//! Per-entity views handed to engine callbacks.

use std::any::Any;
use std::sync::Arc;

use crate::runtime::component::component_id_of;
use crate::runtime::group::{GroupedStorage, ReleasedEntity};
use crate::runtime::storage::SharedHandle;
use crate::runtime::types::{Egid, EntityId, GroupId, KindId};


enum ViewBacking<'a> {
    /// Committed data: reads resolve through the location index at the
    /// entity's actual address.
    Live {
        storage: &'a GroupedStorage,
        located: Egid,
    },

    /// Released data buffered by the scheduler: the slot is already
    /// reclaimed, the values are not.
    Released {
        payload: &'a ReleasedEntity,
    },
}

/// How an engine sees one entity during an add or remove notification.
///
/// The view is addressed by the identity the notification is *about*: for a
/// group swap's remove half, `group()` reports the source group even though
/// the data already lives in the destination. Add views always expose the
/// entity's full committed component set; remove views expose the final
/// values the entity held when its slot was reclaimed.
pub struct EntityView<'a> {
    egid: Egid,
    kind: KindId,
    backing: ViewBacking<'a>,
}

impl<'a> EntityView<'a> {
    pub(crate) fn live(
        storage: &'a GroupedStorage,
        presented: Egid,
        located: Egid,
        kind: KindId,
    ) -> Self {
        Self {
            egid: presented,
            kind,
            backing: ViewBacking::Live { storage, located },
        }
    }

    pub(crate) fn released(payload: &'a ReleasedEntity, egid: Egid, kind: KindId) -> Self {
        Self {
            egid,
            kind,
            backing: ViewBacking::Released { payload },
        }
    }

    /// The identity this notification is about.
    #[inline] pub fn egid(&self) -> Egid { self.egid }
    /// The entity portion of the identity.
    #[inline] pub fn entity(&self) -> EntityId { self.egid.entity() }
    /// The group this entity is viewed under.
    #[inline] pub fn group(&self) -> GroupId { self.egid.group() }
    /// The entity's kind.
    #[inline] pub fn kind(&self) -> KindId { self.kind }

    /// Reads a value-composed component.
    ///
    /// Returns `None` if `T` is not part of this entity's kind.
    pub fn component<T: 'static + Send + Sync + Default>(&self) -> Option<&T> {
        match &self.backing {
            ViewBacking::Live { storage, located } => storage.value::<T>(*located),
            ViewBacking::Released { payload } => payload
                .get(component_id_of::<T>())?
                .downcast_ref::<T>(),
        }
    }

    /// Returns the implementor backing a reference-composed component,
    /// downcast to its concrete type.
    pub fn implementor<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match &self.backing {
            ViewBacking::Live { storage, located } => storage.shared::<T>(*located),
            ViewBacking::Released { payload } => payload
                .get(component_id_of::<T>())?
                .downcast_ref::<SharedHandle>()?
                .clone()
                .downcast::<T>()
                .ok(),
        }
    }
}
