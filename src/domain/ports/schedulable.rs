//! Ports through which domain entities describe their lifecycle times.
//!
//! The scheduler never computes *when* a phase fires. Callers implement these
//! traits on their own entity types and the scheduler asks them for the fire
//! instants of a phase right before (re)scheduling it.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::models::{EntityId, ParticipationLifecycle};

/// Opaque unit of work fired at a lifecycle instant.
///
/// The same payload is executed once per fire time. Its outcome is discarded;
/// panics only show up in the logs and as a `Failed` handle state.
pub type Work = Arc<dyn Fn() + Send + Sync + 'static>;

/// Wrap a closure as [`Work`].
pub fn work<F>(f: F) -> Work
where
    F: Fn() + Send + Sync + 'static,
{
    Arc::new(f)
}

/// An entity whose phases of type `L` can be scheduled.
pub trait Schedulable<L> {
    /// Persisted id, `None` for entities that were never saved.
    fn entity_id(&self) -> Option<EntityId>;

    /// Instants at which `lifecycle` fires for this entity.
    ///
    /// May be empty (phase not set) or hold several instants (e.g. batched
    /// start times).
    fn fire_times(&self, lifecycle: L) -> Vec<DateTime<Utc>>;
}

/// A participation additionally knows the exercise it belongs to.
pub trait ParticipationSchedulable: Schedulable<ParticipationLifecycle> {
    fn exercise_id(&self) -> Option<EntityId>;
}
