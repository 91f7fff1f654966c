//! Periodic sweep of the task registries.
//!
//! Handles are never removed by the execution path, so finished and
//! cancelled handles pile up until the sweep drops them. Pending and running
//! handles are always kept. Entries left without handles are removed
//! afterwards.

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::errors::SchedulerResult;
use crate::domain::models::{LifecycleKey, SchedulerConfig, TaskState};
use crate::domain::ports::work;
use crate::services::scheduler_engine::SchedulerEngine;
use crate::services::task_handle::ScheduledTaskHandle;
use crate::services::task_registry::{SchedulerState, TaskRegistry};

/// Name of the repeating sweep handle.
pub const SWEEP_TASK_NAME: &str = "lifecycle-registry-sweep";

const FIRE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f UTC";

/// Outcome of one registry in one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistrySweep {
    /// Handles present before pruning.
    pub handles: usize,
    /// Handles dropped because they were no longer live.
    pub pruned: usize,
    /// Entries removed because no handles were left.
    pub entries_removed: usize,
}

/// Outcome of one sweep over all registries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub exercise: RegistrySweep,
    pub participation: RegistrySweep,
    pub slide: RegistrySweep,
}

impl SweepReport {
    pub fn total_pruned(&self) -> usize {
        self.exercise.pruned + self.participation.pruned + self.slide.pruned
    }

    pub fn total_entries_removed(&self) -> usize {
        self.exercise.entries_removed
            + self.participation.entries_removed
            + self.slide.entries_removed
    }
}

/// Counters across all sweeps of one [`SweepTask`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStatus {
    pub runs: u64,
    pub total_pruned: u64,
    pub total_entries_removed: u64,
}

#[derive(Debug, Default)]
struct SweepCounters {
    runs: AtomicU64,
    pruned: AtomicU64,
    entries_removed: AtomicU64,
}

/// Scans the registries and reclaims non-live handles.
#[derive(Debug)]
pub struct SweepTask {
    state: Arc<SchedulerState>,
    counters: SweepCounters,
}

impl SweepTask {
    pub fn new(state: Arc<SchedulerState>) -> Self {
        Self {
            state,
            counters: SweepCounters::default(),
        }
    }

    /// Start sweeping on the engine every `sweep_interval_secs`.
    pub fn start(
        self,
        engine: &SchedulerEngine,
        config: &SchedulerConfig,
    ) -> SchedulerResult<SweepHandle> {
        self.start_with_interval(engine, config.sweep_interval(), config.sweep_on_startup)
    }

    /// Start sweeping every `interval`.
    pub fn start_with_interval(
        self,
        engine: &SchedulerEngine,
        interval: Duration,
        run_immediately: bool,
    ) -> SchedulerResult<SweepHandle> {
        let sweep = Arc::new(self);
        let task = Arc::clone(&sweep);
        let handle = engine.schedule_repeating(
            interval,
            run_immediately,
            SWEEP_TASK_NAME,
            work(move || {
                task.run_once();
            }),
        )?;

        tracing::info!(
            interval_secs = interval.as_secs_f64(),
            "registry sweep started"
        );
        Ok(SweepHandle { handle, sweep })
    }

    /// Run one sweep over all registries.
    pub fn run_once(&self) -> SweepReport {
        let report = SweepReport {
            exercise: sweep_registry("exercise", &self.state.exercise_tasks),
            participation: sweep_registry("participation", &self.state.participation_tasks),
            slide: sweep_registry("slide", &self.state.slide_tasks),
        };

        self.counters.runs.fetch_add(1, Ordering::Relaxed);
        self.counters
            .pruned
            .fetch_add(report.total_pruned() as u64, Ordering::Relaxed);
        self.counters
            .entries_removed
            .fetch_add(report.total_entries_removed() as u64, Ordering::Relaxed);

        if report.total_pruned() > 0 {
            tracing::debug!(
                pruned = report.total_pruned(),
                entries_removed = report.total_entries_removed(),
                "registry sweep finished"
            );
        }
        report
    }

    pub fn status(&self) -> SweepStatus {
        SweepStatus {
            runs: self.counters.runs.load(Ordering::Relaxed),
            total_pruned: self.counters.pruned.load(Ordering::Relaxed),
            total_entries_removed: self.counters.entries_removed.load(Ordering::Relaxed),
        }
    }
}

fn sweep_registry<K>(registry_name: &str, registry: &TaskRegistry<K>) -> RegistrySweep
where
    K: Eq + Hash + Clone + Into<LifecycleKey>,
{
    let handles = registry.handle_count();
    tracing::debug!(registry = registry_name, handles, "sweeping task registry");

    let pruned = registry.retain_handles(|key, handle| {
        let state = handle.state();
        if !state.is_terminal() {
            return true;
        }
        log_pruned(key.clone().into(), handle, state);
        false
    });
    let entries_removed = registry.remove_if(|_, handles| handles.is_empty());

    RegistrySweep {
        handles,
        pruned,
        entries_removed,
    }
}

fn log_pruned(key: LifecycleKey, handle: &ScheduledTaskHandle, state: TaskState) {
    let fire_time = handle.projected_fire_time().format(FIRE_TIME_FORMAT);
    match key {
        LifecycleKey::Exercise(key) => tracing::debug!(
            exercise_id = %key.exercise_id,
            lifecycle = %key.lifecycle,
            task = handle.name(),
            fire_time = %fire_time,
            state = %state,
            "removing finished exercise task"
        ),
        LifecycleKey::Participation(key) => tracing::debug!(
            exercise_id = %key.exercise_id,
            participation_id = %key.participation_id,
            lifecycle = %key.lifecycle,
            task = handle.name(),
            fire_time = %fire_time,
            state = %state,
            "removing finished participation task"
        ),
        LifecycleKey::Slide(key) => tracing::debug!(
            slide_id = %key.slide_id,
            lifecycle = %key.lifecycle,
            task = handle.name(),
            fire_time = %fire_time,
            state = %state,
            "removing finished slide task"
        ),
    }
}

/// Handle to a running sweep.
pub struct SweepHandle {
    handle: ScheduledTaskHandle,
    sweep: Arc<SweepTask>,
}

impl SweepHandle {
    /// Stop future sweeps. A sweep already in progress finishes.
    pub fn stop(&self) {
        self.handle.cancel();
        tracing::info!("registry sweep stopped");
    }

    pub fn is_stopped(&self) -> bool {
        self.handle.is_cancelled()
    }

    pub fn status(&self) -> SweepStatus {
        self.sweep.status()
    }

    /// Sweep right now, outside the regular schedule.
    pub fn run_now(&self) -> SweepReport {
        self.sweep.run_once()
    }
}
