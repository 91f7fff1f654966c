use std::sync::Arc;

use chrono::{Duration, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use lifecycle_scheduler::{
    work, EntityId, ExerciseLifecycle, LifecycleScheduleService, PageRequest, Schedulable,
    SchedulerEngine, SchedulerState, SweepTask,
};

struct BenchExercise(i64);

impl Schedulable<ExerciseLifecycle> for BenchExercise {
    fn entity_id(&self) -> Option<EntityId> {
        Some(EntityId(self.0))
    }

    fn fire_times(&self, _lifecycle: ExerciseLifecycle) -> Vec<chrono::DateTime<Utc>> {
        vec![Utc::now() + Duration::hours(1 + self.0 % 24)]
    }
}

fn populated_service(exercises: i64) -> LifecycleScheduleService {
    let engine = SchedulerEngine::with_defaults().expect("engine inside runtime");
    let service = LifecycleScheduleService::new(Arc::new(engine), Arc::new(SchedulerState::new()));
    for id in 0..exercises {
        for lifecycle in ExerciseLifecycle::ALL {
            service
                .schedule_task(&BenchExercise(id), lifecycle, "bench", work(|| {}))
                .expect("schedule");
        }
    }
    service
}

fn bench_registry(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("runtime");
    let _guard = runtime.enter();

    let mut group = c.benchmark_group("registry");
    for exercises in [100, 1_000] {
        let service = populated_service(exercises);
        let sweep = SweepTask::new(Arc::clone(service.state()));

        group.bench_with_input(BenchmarkId::new("sweep_pending", exercises), &exercises, |b, _| {
            b.iter(|| sweep.run_once());
        });
        group.bench_with_input(
            BenchmarkId::new("find_all_exercise_events", exercises),
            &exercises,
            |b, _| {
                b.iter(|| service.find_all_exercise_events(PageRequest::default()));
            },
        );
        group.bench_with_input(BenchmarkId::new("reschedule", exercises), &exercises, |b, _| {
            let mut id = 0;
            b.iter(|| {
                id = (id + 1) % exercises;
                service
                    .schedule_task(&BenchExercise(id), ExerciseLifecycle::Due, "bench", work(|| {}))
                    .expect("schedule");
            });
        });

        service.clear_all_tasks();
    }
    group.finish();
}

criterion_group!(benches, bench_registry);
criterion_main!(benches);
