//! Lifecycle scheduler
//!
//! Runs deferred work at the lifecycle instants of exercises (release, start,
//! due, assessment due, build-and-test after due date), of individual
//! participations and of lecture slides. Each lifecycle slot holds at most
//! one live set of scheduled handles; rescheduling replaces it and a periodic
//! sweep reclaims handles that already ran or were cancelled.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): lifecycle keys, read models and the ports
//!   callers implement on their own entities
//! - **Service Layer** (`services`): the execution engine, handle registries,
//!   the scheduling facade and the registry sweep
//! - **Infrastructure Layer** (`infrastructure`): configuration loading and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use lifecycle_scheduler::{work, ExerciseLifecycle, LifecycleScheduleService, SchedulerEngine, SchedulerState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = Arc::new(SchedulerEngine::with_defaults()?);
//!     let service = LifecycleScheduleService::new(engine, Arc::new(SchedulerState::new()));
//!     service.schedule_task(&exercise, ExerciseLifecycle::Release, "notify-release", work(|| {}))?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    Config, EntityId, EntityKind, ExerciseLifecycle, ExerciseLifecycleKey, LifecycleKey, Page,
    PageRequest, ParticipationLifecycle, ParticipationLifecycleKey, ScheduledExerciseEvent,
    ScheduledParticipationEvent, ScheduledSlideEvent, SchedulerConfig, SlideLifecycle,
    SlideLifecycleKey, TaskState,
};
pub use domain::ports::{work, ParticipationSchedulable, Schedulable, Work};
pub use domain::{SchedulerError, SchedulerResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    LifecycleScheduleService, ScheduledTaskHandle, SchedulerEngine, SchedulerState, SweepHandle,
    SweepReport, SweepTask,
};
