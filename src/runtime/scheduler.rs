//! Submission scheduling and application.
//!
//! This module is responsible for:
//! * draining the submission queue into a consistent batch,
//! * applying every request to grouped storage in FIFO enqueue order,
//! * dispatching notifications once per structural change, in application
//!   order, after all applications complete.
//!
//! ## Cycle model
//!
//! A submission cycle walks the state machine
//!
//! ```text
//! Idle → Draining → Notifying → Idle
//! ```
//!
//! The transition out of `Idle` is triggered externally by the host at a
//! cadence entirely of its choosing — the runtime decides *how* to submit,
//! never *when*. Requests enqueued while a cycle is in flight (typically
//! from inside notification callbacks) are deferred to the next cycle's
//! batch.
//!
//! ## Failure model
//!
//! Every request was validated synchronously when it was enqueued, so an
//! application failure here means storage and queue disagree — a broken
//! runtime invariant, not a host error. Such failures abort loudly rather
//! than propagate.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::runtime::engine::Engine;
use crate::runtime::error::ECSResult;
use crate::runtime::group::GroupedStorage;
use crate::runtime::notifier::{self, AppliedChange};
use crate::runtime::queue::{Request, SubmissionQueue};
use crate::runtime::root::EntityRequests;


/// Where the scheduler currently is in its cycle.
///
/// `Idle` is both the initial state and the only state in which the host
/// may trigger a new cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerPhase {
    /// No cycle in flight; requests accumulate for the next one.
    Idle,

    /// The queued batch is being applied to grouped storage.
    Draining,

    /// Applied changes are being dispatched to interested engines.
    Notifying,
}

/// Summary of one submission cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubmitStats {
    /// Builds committed to storage.
    pub built: usize,

    /// Removals applied.
    pub removed: usize,

    /// Group swaps applied.
    pub swapped: usize,

    /// Engine callbacks invoked.
    pub notifications: usize,
}

/// Runs one full submission cycle.
pub(crate) fn run_submission(
    storage: &mut GroupedStorage,
    queue: &Arc<Mutex<SubmissionQueue>>,
    engines: &mut [Box<dyn Engine>],
    requests: &EntityRequests,
    phase: &mut SchedulerPhase,
) -> SubmitStats {
    debug_assert!(
        *phase == SchedulerPhase::Idle,
        "submission triggered while a cycle is in flight"
    );

    *phase = SchedulerPhase::Draining;
    let batch = queue.lock().unwrap().drain();

    let mut stats = SubmitStats::default();
    let mut changes = Vec::with_capacity(batch.len());

    for request in batch {
        match request {
            Request::Build { cancelled: true, .. } => {
                // Netted out by a same-cycle remove: invisible to consumers.
            }
            Request::Build { kind, egid, mut values, implementors, .. } => {
                expect_applied(
                    storage.allocate(kind, egid, &mut values, &implementors),
                    "build",
                );
                stats.built += 1;
                changes.push(AppliedChange::Added { egid, kind });
            }
            Request::Remove { egid } => {
                let (kind, released) = expect_applied(storage.release(egid), "remove");
                stats.removed += 1;
                changes.push(AppliedChange::Removed { egid, kind, released });
            }
            Request::Swap { entity, from, to } => {
                let (kind, _slot) =
                    expect_applied(storage.relocate(entity, from, to), "group swap");
                stats.swapped += 1;
                changes.push(AppliedChange::Swapped { entity, kind, from, to });
            }
        }
    }

    *phase = SchedulerPhase::Notifying;
    stats.notifications = notifier::dispatch_changes(engines, storage, requests, &changes);
    *phase = SchedulerPhase::Idle;

    debug!(
        built = stats.built,
        removed = stats.removed,
        swapped = stats.swapped,
        notifications = stats.notifications,
        "submission cycle complete"
    );

    stats
}

/// Unwraps an application result.
///
/// Enqueue-time validation guarantees applications succeed; a failure here
/// is a violated storage invariant and aborts the process.
fn expect_applied<T>(result: ECSResult<T>, operation: &str) -> T {
    match result {
        Ok(value) => value,
        Err(error) => panic!("storage corruption detected during {operation}: {error}"),
    }
}
