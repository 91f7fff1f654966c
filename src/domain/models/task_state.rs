//! Execution state of a scheduled handle.

use serde::{Deserialize, Serialize};

/// State of one scheduled unit of work.
///
/// Transitions are driven by the engine only:
/// `Pending -> Running -> Completed | Failed` or `Pending -> Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum TaskState {
    /// Waiting for its fire time (or for a free worker).
    Pending = 0,
    /// Work body is executing.
    Running = 1,
    /// Cancelled before the work body started.
    Cancelled = 2,
    /// Work body returned normally.
    Completed = 3,
    /// Work body panicked.
    Failed = 4,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Cancelled => "CANCELLED",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    /// Whether the handle will never run (again).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed | Self::Failed)
    }

    /// Pending or running.
    pub fn is_live(&self) -> bool {
        !self.is_terminal()
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Pending,
            1 => Self::Running,
            2 => Self::Cancelled,
            3 => Self::Completed,
            _ => Self::Failed,
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
