//! Read models describing pending scheduled work.
//!
//! These are computed on demand from the registries and never stored. The
//! `scheduled_time` is projected from each handle's remaining delay at query
//! time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lifecycle::{EntityId, ExerciseLifecycle, ParticipationLifecycle, SlideLifecycle};
use super::task_state::TaskState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledExerciseEvent {
    pub exercise_id: EntityId,
    pub lifecycle: ExerciseLifecycle,
    pub name: String,
    pub scheduled_time: DateTime<Utc>,
    pub state: TaskState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledParticipationEvent {
    pub exercise_id: EntityId,
    pub participation_id: EntityId,
    pub lifecycle: ParticipationLifecycle,
    pub name: String,
    pub scheduled_time: DateTime<Utc>,
    pub state: TaskState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledSlideEvent {
    pub slide_id: EntityId,
    pub lifecycle: SlideLifecycle,
    pub name: String,
    pub scheduled_time: DateTime<Utc>,
    pub state: TaskState,
}

/// Common accessors used to sort and render the read models.
pub trait ScheduledEvent {
    fn scheduled_time(&self) -> DateTime<Utc>;
    fn name(&self) -> &str;
}

impl ScheduledEvent for ScheduledExerciseEvent {
    fn scheduled_time(&self) -> DateTime<Utc> {
        self.scheduled_time
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl ScheduledEvent for ScheduledParticipationEvent {
    fn scheduled_time(&self) -> DateTime<Utc> {
        self.scheduled_time
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl ScheduledEvent for ScheduledSlideEvent {
    fn scheduled_time(&self) -> DateTime<Utc> {
        self.scheduled_time
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Sort ascending by projected fire time; ties broken by name so listings
/// are stable between calls.
pub fn sort_by_scheduled_time<E: ScheduledEvent>(events: &mut [E]) {
    events.sort_by(|a, b| {
        a.scheduled_time()
            .cmp(&b.scheduled_time())
            .then_with(|| a.name().cmp(b.name()))
    });
}
