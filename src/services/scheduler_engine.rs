//! Scheduler engine.
//!
//! Turns `(instant, work)` pairs into [`ScheduledTaskHandle`]s. Each handle is
//! driven by a lightweight tokio timer; once due, the work body runs on the
//! blocking pool behind a semaphore sized by `worker_threads`, so many
//! simultaneously due tasks run side by side without starving the runtime.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::domain::errors::{SchedulerError, SchedulerResult};
use crate::domain::models::{SchedulerConfig, TaskState};
use crate::domain::ports::Work;
use crate::services::task_handle::ScheduledTaskHandle;

/// Clock-driven dispatcher executing due work on a bounded worker pool.
pub struct SchedulerEngine {
    runtime: Handle,
    workers: Arc<Semaphore>,
    worker_threads: usize,
    shut_down: AtomicBool,
}

impl SchedulerEngine {
    /// Create an engine bound to the current tokio runtime.
    pub fn new(config: &SchedulerConfig) -> SchedulerResult<Self> {
        let runtime = Handle::try_current().map_err(|_| SchedulerError::RuntimeUnavailable)?;
        let worker_threads = config.worker_threads.max(1);

        tracing::debug!(worker_threads, "scheduler engine created");

        Ok(Self {
            runtime,
            workers: Arc::new(Semaphore::new(worker_threads)),
            worker_threads,
            shut_down: AtomicBool::new(false),
        })
    }

    /// Create with default configuration.
    pub fn with_defaults() -> SchedulerResult<Self> {
        Self::new(&SchedulerConfig::default())
    }

    /// Schedule `work` to run once at `fire_at`.
    ///
    /// Instants in the past fire immediately.
    pub fn schedule_at(
        &self,
        fire_at: DateTime<Utc>,
        name: impl Into<String>,
        work: Work,
    ) -> SchedulerResult<ScheduledTaskHandle> {
        self.ensure_running()?;

        let handle = ScheduledTaskHandle::new(name, fire_at);
        let task = self.runtime.spawn(run_once(
            handle.clone(),
            Arc::clone(&self.workers),
            work,
        ));
        handle.attach(task.abort_handle());

        tracing::trace!(task = handle.name(), fire_at = %fire_at, "task scheduled");
        Ok(handle)
    }

    /// Schedule `work` to run every `interval` until the handle is cancelled.
    ///
    /// A zero `interval` is rejected with [`SchedulerError::InvalidInterval`].
    ///
    /// The handle stays `Pending` between runs and is `Running` while a run is
    /// in progress. A failing run is logged and does not stop the schedule.
    pub fn schedule_repeating(
        &self,
        interval: Duration,
        run_immediately: bool,
        name: impl Into<String>,
        work: Work,
    ) -> SchedulerResult<ScheduledTaskHandle> {
        self.ensure_running()?;
        if interval.is_zero() {
            return Err(SchedulerError::InvalidInterval);
        }

        let first_delay = if run_immediately { Duration::ZERO } else { interval };
        let first_fire = now_plus(first_delay);

        let handle = ScheduledTaskHandle::new(name, first_fire);
        let task = self.runtime.spawn(run_repeating(
            handle.clone(),
            Arc::clone(&self.workers),
            interval,
            first_delay,
            work,
        ));
        handle.attach(task.abort_handle());

        tracing::debug!(
            task = handle.name(),
            interval_ms = interval.as_millis() as u64,
            "repeating task scheduled"
        );
        Ok(handle)
    }

    /// Stop accepting work.
    ///
    /// Work bodies already running finish normally; handles still waiting for
    /// their fire time end up `Cancelled` when they come due.
    pub fn shutdown(&self) {
        if !self.shut_down.swap(true, Ordering::AcqRel) {
            self.workers.close();
            tracing::info!("scheduler engine shut down");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    /// Workers not currently executing a work body.
    pub fn available_workers(&self) -> usize {
        self.workers.available_permits()
    }

    fn ensure_running(&self) -> SchedulerResult<()> {
        if self.is_shut_down() {
            return Err(SchedulerError::EngineShutdown);
        }
        Ok(())
    }
}

async fn run_once(handle: ScheduledTaskHandle, workers: Arc<Semaphore>, work: Work) {
    let delay = handle.delay().to_std().unwrap_or(Duration::ZERO);
    tokio::time::sleep(delay).await;

    let Ok(_permit) = workers.acquire_owned().await else {
        handle.inner().transition(TaskState::Pending, TaskState::Cancelled);
        return;
    };

    if !handle.inner().transition(TaskState::Pending, TaskState::Running) {
        return;
    }

    let outcome = execute(&handle, work).await;
    handle.inner().set_state(outcome);
}

async fn run_repeating(
    handle: ScheduledTaskHandle,
    workers: Arc<Semaphore>,
    period: Duration,
    first_delay: Duration,
    work: Work,
) {
    let mut ticker = interval_at(Instant::now() + first_delay, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Ok(permit) = Arc::clone(&workers).acquire_owned().await else {
            handle.inner().transition(TaskState::Pending, TaskState::Cancelled);
            return;
        };

        if !handle.inner().transition(TaskState::Pending, TaskState::Running) {
            return;
        }

        execute(&handle, Arc::clone(&work)).await;
        drop(permit);

        if !rearm(&handle, period) {
            return;
        }
    }
}

/// Move a repeating handle from `Running` back to `Pending` for its next
/// run. Returns false when the schedule ends instead.
fn rearm(handle: &ScheduledTaskHandle, period: Duration) -> bool {
    let inner = handle.inner();
    inner.set_fire_time(now_plus(period));
    if !inner.transition(TaskState::Running, TaskState::Pending) {
        return false;
    }
    // Checked after leaving Running: a cancel issued during the run only set
    // the flag, its own Pending -> Cancelled swap having failed.
    if inner.cancel_requested() {
        inner.transition(TaskState::Pending, TaskState::Cancelled);
        return false;
    }
    true
}

/// Run a work body on the blocking pool and map its outcome to a state.
async fn execute(handle: &ScheduledTaskHandle, work: Work) -> TaskState {
    match tokio::task::spawn_blocking(move || work()).await {
        Ok(()) => TaskState::Completed,
        Err(err) if err.is_panic() => {
            let reason = panic_message(err.into_panic());
            tracing::warn!(
                task = handle.name(),
                task_id = %handle.id(),
                reason = %reason,
                "scheduled task failed"
            );
            TaskState::Failed
        }
        Err(err) => {
            tracing::warn!(task = handle.name(), error = %err, "scheduled task aborted");
            TaskState::Failed
        }
    }
}

fn now_plus(duration: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(duration)
        .ok()
        .and_then(|delta| Utc::now().checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::work;
    use std::sync::atomic::AtomicUsize;

    async fn wait_until(handle: &ScheduledTaskHandle, state: TaskState) {
        for _ in 0..200 {
            if handle.state() == state {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("handle '{}' never reached {state}, is {}", handle.name(), handle.state());
    }

    #[test]
    fn test_new_outside_runtime_fails() {
        assert!(matches!(
            SchedulerEngine::with_defaults(),
            Err(SchedulerError::RuntimeUnavailable)
        ));
    }

    #[tokio::test]
    async fn test_schedule_at_runs_work() {
        let engine = SchedulerEngine::with_defaults().unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);

        let handle = engine
            .schedule_at(
                Utc::now() + chrono::Duration::milliseconds(20),
                "count",
                work(move || {
                    c.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();
        assert_eq!(handle.state(), TaskState::Pending);

        wait_until(&handle, TaskState::Completed).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_past_instant_fires_immediately() {
        let engine = SchedulerEngine::with_defaults().unwrap();
        let handle = engine
            .schedule_at(Utc::now() - chrono::Duration::hours(1), "late", work(|| {}))
            .unwrap();
        wait_until(&handle, TaskState::Completed).await;
    }

    #[tokio::test]
    async fn test_cancelled_work_never_runs() {
        let engine = SchedulerEngine::with_defaults().unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);

        let handle = engine
            .schedule_at(
                Utc::now() + chrono::Duration::milliseconds(50),
                "cancel-me",
                work(move || {
                    c.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();
        assert!(handle.cancel());

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(handle.state(), TaskState::Cancelled);
    }

    #[tokio::test]
    async fn test_panicking_work_marks_failed() {
        let engine = SchedulerEngine::with_defaults().unwrap();
        let handle = engine
            .schedule_at(Utc::now(), "boom", work(|| panic!("work exploded")))
            .unwrap();
        wait_until(&handle, TaskState::Failed).await;
    }

    #[tokio::test]
    async fn test_repeating_runs_until_cancelled() {
        let engine = SchedulerEngine::with_defaults().unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);

        let handle = engine
            .schedule_repeating(
                Duration::from_millis(20),
                true,
                "tick",
                work(move || {
                    c.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();

        tokio::time::sleep(Duration::from_millis(130)).await;
        assert!(counter.load(Ordering::SeqCst) >= 2);

        handle.cancel();
        wait_until(&handle, TaskState::Cancelled).await;
        let runs = counter.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(counter.load(Ordering::SeqCst), runs);
    }

    #[tokio::test]
    async fn test_zero_interval_rejected() {
        let engine = SchedulerEngine::with_defaults().unwrap();
        assert_eq!(
            engine
                .schedule_repeating(Duration::ZERO, true, "zero", work(|| {}))
                .unwrap_err(),
            SchedulerError::InvalidInterval
        );
        assert_eq!(engine.available_workers(), engine.worker_threads());
    }

    #[test]
    fn test_rearm_honours_cancel_issued_while_running() {
        let handle = ScheduledTaskHandle::new("tick", Utc::now());
        handle.inner().set_state(TaskState::Running);

        assert!(!handle.cancel(), "a running handle is not cancelled directly");
        assert_eq!(handle.state(), TaskState::Running);

        assert!(!rearm(&handle, Duration::from_millis(10)));
        assert_eq!(handle.state(), TaskState::Cancelled);
    }

    #[test]
    fn test_rearm_returns_to_pending() {
        let handle = ScheduledTaskHandle::new("tick", Utc::now());
        handle.inner().set_state(TaskState::Running);

        assert!(rearm(&handle, Duration::from_secs(60)));
        assert_eq!(handle.state(), TaskState::Pending);
        assert!(handle.fire_time() > Utc::now());
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_work() {
        let engine = SchedulerEngine::with_defaults().unwrap();
        let pending = engine
            .schedule_at(Utc::now() + chrono::Duration::milliseconds(30), "pending", work(|| {}))
            .unwrap();

        engine.shutdown();
        assert!(engine.is_shut_down());
        assert_eq!(
            engine.schedule_at(Utc::now(), "rejected", work(|| {})).unwrap_err(),
            SchedulerError::EngineShutdown
        );

        wait_until(&pending, TaskState::Cancelled).await;
    }

    #[tokio::test]
    async fn test_worker_pool_bounds_concurrency() {
        let config = SchedulerConfig {
            worker_threads: 2,
            ..Default::default()
        };
        let engine = SchedulerEngine::new(&config).unwrap();
        assert_eq!(engine.worker_threads(), 2);

        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();
        for i in 0..6 {
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            handles.push(
                engine
                    .schedule_at(
                        Utc::now(),
                        format!("worker-{i}"),
                        work(move || {
                            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                            peak.fetch_max(now, Ordering::SeqCst);
                            std::thread::sleep(Duration::from_millis(20));
                            active.fetch_sub(1, Ordering::SeqCst);
                        }),
                    )
                    .unwrap(),
            );
        }

        for handle in &handles {
            wait_until(handle, TaskState::Completed).await;
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }
}
