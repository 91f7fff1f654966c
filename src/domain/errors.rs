//! Domain errors for the lifecycle scheduler.

use thiserror::Error;

use super::models::lifecycle::EntityKind;

/// Errors surfaced by scheduling operations.
///
/// Cancellation never fails, so none of these variants are produced by the
/// `cancel_*` family.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// The entity handed to a `schedule_*` call has no persisted id.
    #[error("Cannot schedule a task for a {kind} without an id")]
    MissingEntityId { kind: EntityKind },

    /// The engine was shut down and no longer accepts work.
    #[error("Scheduler engine has been shut down")]
    EngineShutdown,

    /// The engine was constructed outside of a tokio runtime.
    #[error("No tokio runtime available to drive the scheduler engine")]
    RuntimeUnavailable,

    /// A repeating task was given a zero period.
    #[error("Repeat interval must be greater than zero")]
    InvalidInterval,

    #[error("Invalid page request: page {page}, size {size} (size must be at least 1)")]
    InvalidPageRequest { page: usize, size: usize },
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
