//! Common test utilities for integration tests
//!
//! Provides fake schedulable entities and helpers shared across
//! integration test files.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use lifecycle_scheduler::domain::models::SchedulerConfig;
use lifecycle_scheduler::{
    EntityId, ExerciseLifecycle, LifecycleScheduleService, ParticipationLifecycle,
    ParticipationSchedulable, Schedulable, SchedulerEngine, SchedulerState, SlideLifecycle,
};

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Wait for a condition to be true with timeout
///
/// Polls the predicate every 10ms until it returns true or timeout is reached.
pub async fn wait_for<F>(mut predicate: F, timeout_ms: u64) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(timeout_ms);

    while start.elapsed() < timeout {
        if predicate() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    predicate()
}

/// Service wired to a fresh engine and registry set.
///
/// Must be called from inside a tokio runtime.
pub fn test_service() -> LifecycleScheduleService {
    let config = SchedulerConfig {
        worker_threads: 4,
        ..Default::default()
    };
    let engine = SchedulerEngine::new(&config).expect("engine inside runtime");
    LifecycleScheduleService::new(Arc::new(engine), Arc::new(SchedulerState::new()))
}

/// Counter incremented by scheduled work.
#[derive(Clone, Default)]
pub struct FireCounter(Arc<AtomicUsize>);

impl FireCounter {
    pub fn work(&self) -> lifecycle_scheduler::Work {
        let counter = Arc::clone(&self.0);
        lifecycle_scheduler::work(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

pub fn in_ms(ms: i64) -> DateTime<Utc> {
    Utc::now() + Duration::milliseconds(ms)
}

pub fn in_hours(hours: i64) -> DateTime<Utc> {
    Utc::now() + Duration::hours(hours)
}

/// Exercise whose every phase fires at the same configured instants.
#[derive(Debug, Clone)]
pub struct FakeExercise {
    pub id: Option<EntityId>,
    pub fire_times: Vec<DateTime<Utc>>,
}

impl FakeExercise {
    pub fn at(id: i64, fire_at: DateTime<Utc>) -> Self {
        Self {
            id: Some(EntityId(id)),
            fire_times: vec![fire_at],
        }
    }
}

impl Schedulable<ExerciseLifecycle> for FakeExercise {
    fn entity_id(&self) -> Option<EntityId> {
        self.id
    }

    fn fire_times(&self, _lifecycle: ExerciseLifecycle) -> Vec<DateTime<Utc>> {
        self.fire_times.clone()
    }
}

#[derive(Debug, Clone)]
pub struct FakeParticipation {
    pub id: Option<EntityId>,
    pub exercise_id: Option<EntityId>,
    pub fire_at: DateTime<Utc>,
}

impl FakeParticipation {
    pub fn at(exercise_id: i64, id: i64, fire_at: DateTime<Utc>) -> Self {
        Self {
            id: Some(EntityId(id)),
            exercise_id: Some(EntityId(exercise_id)),
            fire_at,
        }
    }
}

impl Schedulable<ParticipationLifecycle> for FakeParticipation {
    fn entity_id(&self) -> Option<EntityId> {
        self.id
    }

    fn fire_times(&self, _lifecycle: ParticipationLifecycle) -> Vec<DateTime<Utc>> {
        vec![self.fire_at]
    }
}

impl ParticipationSchedulable for FakeParticipation {
    fn exercise_id(&self) -> Option<EntityId> {
        self.exercise_id
    }
}

#[derive(Debug, Clone)]
pub struct FakeSlide {
    pub id: Option<EntityId>,
    pub unhide_at: Option<DateTime<Utc>>,
}

impl Schedulable<SlideLifecycle> for FakeSlide {
    fn entity_id(&self) -> Option<EntityId> {
        self.id
    }

    fn fire_times(&self, _lifecycle: SlideLifecycle) -> Vec<DateTime<Utc>> {
        self.unhide_at.into_iter().collect()
    }
}
