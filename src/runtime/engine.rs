//! Engine Abstractions
//!
//! This module defines the *consumer model* of the runtime.
//!
//! An **engine** is a unit of logic that reacts to entities appearing or
//! disappearing and periodically bulk-processes component data. Engines:
//! - declare which component shapes they consume,
//! - are notified exactly once per structural change that matches their
//!   interest,
//! - perform their periodic work as a resumable task driven cooperatively
//!   by the host loop,
//! - operate through narrow handles rather than direct storage access.
//!
//! ## Notification Model
//!
//! The notifier compares an engine's declared [`Signature`] against the
//! changed entity's kind:
//!
//! - `on_add` runs after the entity's full component set is committed, so
//!   an engine interested in components A and B never observes A alone.
//! - `on_remove` runs with the entity's final component values still
//!   readable.
//! - A group swap is modeled as remove-from-source plus add-to-destination;
//!   there is no third callback kind.
//!
//! An engine whose interest signature is empty receives no notifications;
//! such engines typically only implement [`Engine::update`].
//!
//! ## Cooperative Execution
//!
//! [`Engine::update`] is resumed once per turn by the driving loop, in
//! registration order, and yields an [`EngineStatus`] marker: `Continue` to
//! be resumed again next turn, `Done` when the engine has no further work
//! this cycle. An engine that never yields starves all others — that
//! responsibility sits with engine authors, not the runtime.
//!
//! ## Structural Changes
//!
//! Inside callbacks and updates, engines may enqueue further builds,
//! removals, and swaps through the supplied request handle; those apply at
//! the next submission. Engines must never mutate grouped storage
//! structurally themselves.

use crate::runtime::root::{EntityQueries, EntityRequests};
use crate::runtime::types::Signature;
use crate::runtime::view::EntityView;


/// Yield marker returned by [`Engine::update`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineStatus {
    /// The engine has more work and should be resumed next turn.
    Continue,

    /// The engine is finished for now.
    Done,
}

/// A consumer of entity notifications and grouped component data.
///
/// Engines must be `Send` so a host may drive the runtime from a thread of
/// its choosing; all engine execution nevertheless happens on the single
/// driving thread.
pub trait Engine: Send {
    /// Returns the human-readable name of this engine.
    fn name(&self) -> &'static str;

    /// Returns the component interest set used for notification matching.
    ///
    /// The default (empty) signature opts out of notifications entirely.
    fn interest(&self) -> Signature {
        Signature::default()
    }

    /// Called once for every matching entity whose build was applied.
    fn on_add(&mut self, _entity: EntityView<'_>, _requests: &EntityRequests) {}

    /// Called once for every matching entity whose removal was applied,
    /// with the final component values still readable.
    fn on_remove(&mut self, _entity: EntityView<'_>, _requests: &EntityRequests) {}

    /// Resumes this engine's periodic work for one turn.
    fn update(
        &mut self,
        _queries: EntityQueries<'_>,
        _requests: &EntityRequests,
    ) -> EngineStatus {
        EngineStatus::Done
    }
}

/// A concrete [`Engine`] backed by an update function or closure.
///
/// `FnEngine` allows update-only engines to be defined inline without a
/// dedicated type. Function-backed engines declare no interest and receive
/// no notifications.
pub struct FnEngine<F>
where
    F: FnMut(EntityQueries<'_>, &EntityRequests) -> EngineStatus + Send,
{
    name: &'static str,
    f: F,
}

impl<F> FnEngine<F>
where
    F: FnMut(EntityQueries<'_>, &EntityRequests) -> EngineStatus + Send,
{
    /// Creates a new function-backed engine.
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

impl<F> Engine for FnEngine<F>
where
    F: FnMut(EntityQueries<'_>, &EntityRequests) -> EngineStatus + Send,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn update(
        &mut self,
        queries: EntityQueries<'_>,
        requests: &EntityRequests,
    ) -> EngineStatus {
        (self.f)(queries, requests)
    }
}
