//! Runtime root and the narrow capability handles.
//!
//! This module defines the central orchestration layer of the runtime,
//! responsible for:
//!
//! * owning grouped storage, the submission queue, and the engine roster,
//! * running submission cycles at the host's command,
//! * driving engines cooperatively, one resumable turn at a time,
//! * handing collaborators narrow capability handles instead of itself.
//!
//! ## Capability model
//!
//! The root is never given to engines or producers. Two handles bound what
//! external code can do:
//!
//! * [`EntityRequests`] — enqueue builds, removals, and group swaps. Cheap
//!   to clone, safe to call from inside engine callbacks.
//! * [`EntityQueries`] — read and mutate dense component data in place.
//!   Only lent out while the root itself is not mid-cycle.
//!
//! ## Concurrency model
//!
//! A single logical thread drives the whole system: the host resumes
//! engines and triggers submissions from one loop. The queue sits behind a
//! mutex so request handles work from anywhere on that thread; storage is
//! exclusively owned by the root. The parallel bulk helper fans one dense
//! column out over disjoint chunks and performs no structural mutation.

use std::any::Any;
use std::sync::{Arc, Mutex};

use rayon::prelude::*;

use crate::runtime::engine::{Engine, EngineStatus};
use crate::runtime::error::ECSResult;
use crate::runtime::group::GroupedStorage;
use crate::runtime::queue::SubmissionQueue;
use crate::runtime::scheduler::{self, SchedulerPhase, SubmitStats};
use crate::runtime::storage::SharedHandle;
use crate::runtime::types::{Egid, EntityId, GroupId, KindId, ValueSet, GROUP_DEFAULT};


/// Rows per parallel work chunk in the bulk iteration helper.
const PAR_CHUNK_ROWS: usize = 4096;

/// Cloneable submission handle: the only way producers and engines request
/// structural changes.
///
/// Every operation validates synchronously and either succeeds or returns
/// an error that is fatal to the request, never to the process. Changes
/// apply at the next submission cycle.
#[derive(Clone)]
pub struct EntityRequests {
    queue: Arc<Mutex<SubmissionQueue>>,
}

impl EntityRequests {
    /// Requests a build of `kind` as `(entity, group)`, with all
    /// value-composed components default-constructed.
    pub fn build(&self, kind: KindId, entity: EntityId, group: GroupId) -> ECSResult<()> {
        self.build_with(kind, entity, group, ValueSet::new(), Vec::new())
    }

    /// Requests a build of `kind` as an ungrouped entity (the default
    /// group).
    pub fn build_ungrouped(&self, kind: KindId, entity: EntityId) -> ECSResult<()> {
        self.build(kind, entity, GROUP_DEFAULT)
    }

    /// Requests a build with explicit initial values and implementor
    /// handles.
    ///
    /// One implementor of the registered concrete type must be supplied per
    /// reference-composed component of the kind.
    pub fn build_with(
        &self,
        kind: KindId,
        entity: EntityId,
        group: GroupId,
        values: ValueSet,
        implementors: Vec<SharedHandle>,
    ) -> ECSResult<()> {
        self.queue
            .lock()
            .unwrap()
            .enqueue_build(kind, Egid::new(entity, group), values, implementors)
    }

    /// Requests removal of `(entity, group)`.
    pub fn remove(&self, entity: EntityId, group: GroupId) -> ECSResult<()> {
        self.queue
            .lock()
            .unwrap()
            .enqueue_remove(Egid::new(entity, group))
    }

    /// Requests moving `entity` from group `from` to group `to`, preserving
    /// component values.
    pub fn swap_group(&self, entity: EntityId, from: GroupId, to: GroupId) -> ECSResult<()> {
        self.queue.lock().unwrap().enqueue_swap(entity, from, to)
    }

    /// Number of requests waiting for the next submission.
    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap().pending_len()
    }
}

/// Read/write access to dense component data, lent to engines during their
/// update turn and to the host between cycles.
///
/// No slot stability is guaranteed across a submission cycle; complete a
/// query-based pass before yielding back to the driving loop.
pub struct EntityQueries<'a> {
    storage: &'a mut GroupedStorage,
}

impl<'a> EntityQueries<'a> {
    /// Returns the dense values of component `T` for `(kind, group)`.
    ///
    /// A group with no entities of the kind yields an empty slice.
    pub fn query<T: 'static + Send + Sync + Default>(
        &self,
        kind: KindId,
        group: GroupId,
    ) -> &[T] {
        self.storage.query_slice::<T>(kind, group)
    }

    /// Returns the dense values of component `T` for `(kind, group)` as a
    /// mutable slice for in-place, branch-free bulk updates.
    pub fn query_mut<T: 'static + Send + Sync + Default>(
        &mut self,
        kind: KindId,
        group: GroupId,
    ) -> &mut [T] {
        self.storage.query_slice_mut::<T>(kind, group)
    }

    /// Returns the owner list for `(kind, group)`, slot-aligned with every
    /// dense slice of the same table.
    pub fn entities(&self, kind: KindId, group: GroupId) -> &[EntityId] {
        self.storage.entities(kind, group)
    }

    /// Returns the implementor backing one entity's reference-composed
    /// component.
    pub fn shared<T: Any + Send + Sync>(&self, egid: Egid) -> Option<Arc<T>> {
        self.storage.shared::<T>(egid)
    }

    /// Returns `true` if `egid` has committed component data.
    pub fn is_alive(&self, egid: Egid) -> bool {
        self.storage.contains(egid)
    }

    /// Applies `f` to every value of component `T` in `(kind, group)`,
    /// fanning disjoint chunks of the dense column out across the rayon
    /// pool.
    ///
    /// Purely data-parallel: no structural mutation, no slot movement.
    pub fn par_for_each_mut<T, F>(&mut self, kind: KindId, group: GroupId, f: F)
    where
        T: 'static + Send + Sync + Default,
        F: Fn(&mut T) + Send + Sync,
    {
        let values = self.storage.query_slice_mut::<T>(kind, group);
        values
            .par_chunks_mut(PAR_CHUNK_ROWS)
            .for_each(|chunk| {
                for value in chunk {
                    f(value);
                }
            });
    }
}

/// Report of one cooperative turn: engine progress plus the submission
/// cycle that closed the turn.
#[derive(Clone, Copy, Debug)]
pub struct TickReport {
    /// `Done` when every engine finished its work this turn.
    pub engines: EngineStatus,

    /// Summary of the submission cycle run at the turn boundary.
    pub stats: SubmitStats,
}

/// Owner of the whole runtime: grouped storage, submission queue, and the
/// engine roster.
///
/// ## Role
/// The root is the single integration point a host scheduler drives. It is
/// constructed once, engines are registered in notification order, and the
/// host then alternates engine turns and submission cycles at whatever
/// cadence it chooses.
pub struct ECSRoot {
    storage: GroupedStorage,
    queue: Arc<Mutex<SubmissionQueue>>,
    engines: Vec<Box<dyn Engine>>,
    phase: SchedulerPhase,
}

impl ECSRoot {
    /// Creates an empty runtime.
    ///
    /// Component and kind registration is global and must be frozen via
    /// `freeze_definitions` before the first build request.
    pub fn new() -> Self {
        Self {
            storage: GroupedStorage::new(),
            queue: Arc::new(Mutex::new(SubmissionQueue::new())),
            engines: Vec::new(),
            phase: SchedulerPhase::Idle,
        }
    }

    /// Returns a submission handle.
    pub fn requests(&self) -> EntityRequests {
        EntityRequests { queue: Arc::clone(&self.queue) }
    }

    /// Lends out the query surface.
    pub fn queries(&mut self) -> EntityQueries<'_> {
        EntityQueries { storage: &mut self.storage }
    }

    /// Adds an engine to the notification roster.
    ///
    /// Registration order determines notification order for simultaneous
    /// changes, and turn order for cooperative updates.
    pub fn register_engine(&mut self, engine: Box<dyn Engine>) {
        self.engines.push(engine);
    }

    /// Runs one submission cycle: drains the queue, applies every request
    /// in FIFO order, then notifies interested engines once per change.
    pub fn submit(&mut self) -> SubmitStats {
        let requests = EntityRequests { queue: Arc::clone(&self.queue) };
        scheduler::run_submission(
            &mut self.storage,
            &self.queue,
            &mut self.engines,
            &requests,
            &mut self.phase,
        )
    }

    /// Resumes every engine's update once, in registration order.
    ///
    /// Returns `Done` when all engines reported `Done` this turn.
    pub fn step_engines(&mut self) -> EngineStatus {
        let requests = EntityRequests { queue: Arc::clone(&self.queue) };
        let mut all_done = true;

        for engine in self.engines.iter_mut() {
            let queries = EntityQueries { storage: &mut self.storage };
            if engine.update(queries, &requests) == EngineStatus::Continue {
                all_done = false;
            }
        }

        if all_done { EngineStatus::Done } else { EngineStatus::Continue }
    }

    /// One cooperative turn: resume every engine once, then submit.
    pub fn tick(&mut self) -> TickReport {
        let engines = self.step_engines();
        let stats = self.submit();
        TickReport { engines, stats }
    }

    /// Where the scheduler currently is in its cycle.
    pub fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    /// Reserves backing storage for a burst of builds. Performance hint
    /// only.
    pub fn preallocate(&mut self, kind: KindId, group: GroupId, capacity: usize) -> ECSResult<()> {
        self.storage.preallocate(kind, group, capacity)
    }

    /// Returns the dense values of component `T` for `(kind, group)`.
    pub fn query<T: 'static + Send + Sync + Default>(
        &self,
        kind: KindId,
        group: GroupId,
    ) -> &[T] {
        self.storage.query_slice::<T>(kind, group)
    }

    /// Returns the dense values of component `T` for `(kind, group)` as a
    /// mutable slice.
    pub fn query_mut<T: 'static + Send + Sync + Default>(
        &mut self,
        kind: KindId,
        group: GroupId,
    ) -> &mut [T] {
        self.storage.query_slice_mut::<T>(kind, group)
    }

    /// Returns the owner list for `(kind, group)`.
    pub fn entities(&self, kind: KindId, group: GroupId) -> &[EntityId] {
        self.storage.entities(kind, group)
    }

    /// Reads one entity's value-composed component.
    pub fn value<T: 'static + Send + Sync + Default>(&self, egid: Egid) -> Option<&T> {
        self.storage.value::<T>(egid)
    }

    /// Returns the implementor backing one entity's reference-composed
    /// component.
    pub fn shared<T: Any + Send + Sync>(&self, egid: Egid) -> Option<Arc<T>> {
        self.storage.shared::<T>(egid)
    }

    /// Returns `true` if `egid` has committed component data.
    pub fn is_alive(&self, egid: Egid) -> bool {
        self.storage.contains(egid)
    }

    /// Number of live entities across all groups.
    pub fn live_count(&self) -> usize {
        self.storage.live_count()
    }
}

impl Default for ECSRoot {
    fn default() -> Self {
        Self::new()
    }
}
