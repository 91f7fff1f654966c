//! Scheduling services: engine, registries, the lifecycle facade and the sweep.

pub mod lifecycle_schedule_service;
pub mod scheduler_engine;
pub mod sweep;
pub mod task_handle;
pub mod task_registry;

pub use lifecycle_schedule_service::LifecycleScheduleService;
pub use scheduler_engine::SchedulerEngine;
pub use sweep::{RegistrySweep, SweepHandle, SweepReport, SweepStatus, SweepTask};
pub use task_handle::ScheduledTaskHandle;
pub use task_registry::{HandleSet, SchedulerState, TaskRegistry};
