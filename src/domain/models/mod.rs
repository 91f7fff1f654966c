//! Domain models for the lifecycle scheduler.

pub mod config;
pub mod lifecycle;
pub mod page;
pub mod scheduled_event;
pub mod task_state;

pub use config::{Config, SchedulerConfig};
pub use lifecycle::{
    EntityId, EntityKind, ExerciseLifecycle, ExerciseLifecycleKey, LifecycleKey,
    ParticipationLifecycle, ParticipationLifecycleKey, SlideLifecycle, SlideLifecycleKey,
};
pub use page::{paginate, Page, PageRequest};
pub use scheduled_event::{
    ScheduledEvent, ScheduledExerciseEvent, ScheduledParticipationEvent, ScheduledSlideEvent,
};
pub use task_state::TaskState;
