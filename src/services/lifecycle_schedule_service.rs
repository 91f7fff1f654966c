//! Lifecycle scheduling service.
//!
//! Coordinates the [`SchedulerEngine`] (time-keeping and execution) with the
//! [`SchedulerState`] registries (bookkeeping). Every lifecycle slot holds at
//! most one live set of handles: scheduling a slot first cancels and removes
//! whatever was registered for it.
//!
//! Cancel-then-put is not atomic. Two concurrent `schedule_*` calls for the
//! same slot can interleave so that one caller's handles stay live without
//! being registered; the registry keeps whichever `put` lands last.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::errors::{SchedulerError, SchedulerResult};
use crate::domain::models::scheduled_event::sort_by_scheduled_time;
use crate::domain::models::{
    paginate, EntityId, EntityKind, ExerciseLifecycle, ExerciseLifecycleKey, Page, PageRequest,
    ParticipationLifecycle, ParticipationLifecycleKey, ScheduledExerciseEvent,
    ScheduledParticipationEvent, ScheduledSlideEvent, SlideLifecycle, SlideLifecycleKey,
};
use crate::domain::ports::{ParticipationSchedulable, Schedulable, Work};
use crate::services::scheduler_engine::SchedulerEngine;
use crate::services::task_registry::{HandleSet, SchedulerState, TaskRegistry};

/// Public scheduling operations for exercises, participations and slides.
pub struct LifecycleScheduleService {
    engine: Arc<SchedulerEngine>,
    state: Arc<SchedulerState>,
}

impl LifecycleScheduleService {
    pub fn new(engine: Arc<SchedulerEngine>, state: Arc<SchedulerState>) -> Self {
        Self { engine, state }
    }

    pub fn state(&self) -> &Arc<SchedulerState> {
        &self.state
    }

    pub fn engine(&self) -> &Arc<SchedulerEngine> {
        &self.engine
    }

    // ------------------------------------------------------------------
    // Scheduling
    // ------------------------------------------------------------------

    /// Schedule `work` at every fire time of `lifecycle` for `exercise`,
    /// replacing anything already scheduled for that slot.
    pub fn schedule_task<E>(
        &self,
        exercise: &E,
        lifecycle: ExerciseLifecycle,
        name: impl Into<String>,
        work: Work,
    ) -> SchedulerResult<()>
    where
        E: Schedulable<ExerciseLifecycle> + ?Sized,
    {
        let exercise_id = require_id(exercise.entity_id(), EntityKind::Exercise)?;
        let key = ExerciseLifecycleKey::new(exercise_id, lifecycle);

        self.cancel_scheduled_task_for_lifecycle(exercise_id, lifecycle);

        let name = name.into();
        let fire_times = exercise.fire_times(lifecycle);
        let handles = self.schedule_all(
            fire_times.into_iter().map(|at| (at, Arc::clone(&work))),
            &name,
        )?;

        tracing::debug!(
            exercise_id = %exercise_id,
            lifecycle = %lifecycle,
            task = %name,
            handles = handles.len(),
            "scheduled exercise task"
        );
        store(&self.state.exercise_tasks, key, handles);
        Ok(())
    }

    /// Schedule caller-computed instants, each with its own payload, under
    /// one exercise slot. Used when the fire times do not follow from the
    /// exercise itself (e.g. exam unlocks, per-working-time locks).
    pub fn schedule_task_at<E>(
        &self,
        exercise: &E,
        lifecycle: ExerciseLifecycle,
        name: impl Into<String>,
        tasks: Vec<(DateTime<Utc>, Work)>,
    ) -> SchedulerResult<()>
    where
        E: Schedulable<ExerciseLifecycle> + ?Sized,
    {
        let exercise_id = require_id(exercise.entity_id(), EntityKind::Exercise)?;
        let key = ExerciseLifecycleKey::new(exercise_id, lifecycle);

        self.cancel_scheduled_task_for_lifecycle(exercise_id, lifecycle);

        let name = name.into();
        let handles = self.schedule_all(tasks, &name)?;

        tracing::debug!(
            exercise_id = %exercise_id,
            lifecycle = %lifecycle,
            task = %name,
            handles = handles.len(),
            "scheduled exercise tasks at explicit times"
        );
        store(&self.state.exercise_tasks, key, handles);
        Ok(())
    }

    /// Schedule `work` for an individual participation phase, replacing
    /// anything already scheduled for that slot.
    pub fn schedule_participation_task<P>(
        &self,
        participation: &P,
        lifecycle: ParticipationLifecycle,
        name: impl Into<String>,
        work: Work,
    ) -> SchedulerResult<()>
    where
        P: ParticipationSchedulable + ?Sized,
    {
        let exercise_id = require_id(participation.exercise_id(), EntityKind::Exercise)?;
        let participation_id = require_id(participation.entity_id(), EntityKind::Participation)?;
        let key = ParticipationLifecycleKey::new(exercise_id, participation_id, lifecycle);

        self.cancel_scheduled_task_for_participation_lifecycle(
            exercise_id,
            participation_id,
            lifecycle,
        );

        let name = name.into();
        let fire_times = participation.fire_times(lifecycle);
        let handles = self.schedule_all(
            fire_times.into_iter().map(|at| (at, Arc::clone(&work))),
            &name,
        )?;

        tracing::debug!(
            exercise_id = %exercise_id,
            participation_id = %participation_id,
            lifecycle = %lifecycle,
            task = %name,
            handles = handles.len(),
            "scheduled participation task"
        );
        store(&self.state.participation_tasks, key, handles);
        Ok(())
    }

    /// Schedule `work` for a slide phase, replacing anything already
    /// scheduled for that slot.
    pub fn schedule_slide_task<S>(
        &self,
        slide: &S,
        lifecycle: SlideLifecycle,
        name: impl Into<String>,
        work: Work,
    ) -> SchedulerResult<()>
    where
        S: Schedulable<SlideLifecycle> + ?Sized,
    {
        let slide_id = require_id(slide.entity_id(), EntityKind::Slide)?;
        let key = SlideLifecycleKey::new(slide_id, lifecycle);

        self.cancel_scheduled_task_for_slide_lifecycle(slide_id, lifecycle);

        let name = name.into();
        let fire_times = slide.fire_times(lifecycle);
        let handles = self.schedule_all(
            fire_times.into_iter().map(|at| (at, Arc::clone(&work))),
            &name,
        )?;

        tracing::debug!(
            slide_id = %slide_id,
            lifecycle = %lifecycle,
            task = %name,
            handles = handles.len(),
            "scheduled slide task"
        );
        store(&self.state.slide_tasks, key, handles);
        Ok(())
    }

    fn schedule_all<I>(&self, tasks: I, name: &str) -> SchedulerResult<HandleSet>
    where
        I: IntoIterator<Item = (DateTime<Utc>, Work)>,
    {
        let mut handles = HashSet::new();
        for (fire_at, work) in tasks {
            match self.engine.schedule_at(fire_at, name, work) {
                Ok(handle) => {
                    handles.insert(handle);
                }
                Err(err) => {
                    // Nothing gets registered, so nothing may stay live.
                    for handle in &handles {
                        handle.cancel();
                    }
                    return Err(err);
                }
            }
        }
        Ok(handles)
    }

    // ------------------------------------------------------------------
    // Cancellation
    // ------------------------------------------------------------------

    /// Cancel the exercise slot and, when the phase has a participation
    /// counterpart, that counterpart for every participation of the exercise.
    pub fn cancel_scheduled_task_for_lifecycle(
        &self,
        exercise_id: EntityId,
        lifecycle: ExerciseLifecycle,
    ) {
        let key = ExerciseLifecycleKey::new(exercise_id, lifecycle);
        if let Some(handles) = self.state.exercise_tasks.remove(&key) {
            tracing::debug!(
                exercise_id = %exercise_id,
                lifecycle = %lifecycle,
                handles = handles.len(),
                "cancelling scheduled exercise task"
            );
            cancel_all(&handles);
        }

        let Some(participation_lifecycle) = lifecycle.participation_lifecycle() else {
            return;
        };

        let dependent = self.state.participation_tasks.keys_matching(|key| {
            key.exercise_id == exercise_id && key.lifecycle == participation_lifecycle
        });
        for key in dependent {
            self.cancel_scheduled_task_for_participation_lifecycle(
                key.exercise_id,
                key.participation_id,
                key.lifecycle,
            );
        }
    }

    pub fn cancel_scheduled_task_for_participation_lifecycle(
        &self,
        exercise_id: EntityId,
        participation_id: EntityId,
        lifecycle: ParticipationLifecycle,
    ) {
        let key = ParticipationLifecycleKey::new(exercise_id, participation_id, lifecycle);
        if let Some(handles) = self.state.participation_tasks.remove(&key) {
            tracing::debug!(
                exercise_id = %exercise_id,
                participation_id = %participation_id,
                lifecycle = %lifecycle,
                handles = handles.len(),
                "cancelling scheduled participation task"
            );
            cancel_all(&handles);
        }
    }

    pub fn cancel_scheduled_task_for_slide_lifecycle(
        &self,
        slide_id: EntityId,
        lifecycle: SlideLifecycle,
    ) {
        let key = SlideLifecycleKey::new(slide_id, lifecycle);
        if let Some(handles) = self.state.slide_tasks.remove(&key) {
            tracing::debug!(
                slide_id = %slide_id,
                lifecycle = %lifecycle,
                handles = handles.len(),
                "cancelling scheduled slide task"
            );
            cancel_all(&handles);
        }
    }

    /// Cancel every phase of one participation, e.g. before deleting it.
    pub fn cancel_all_scheduled_participation_tasks(
        &self,
        exercise_id: EntityId,
        participation_id: EntityId,
    ) {
        for lifecycle in ParticipationLifecycle::ALL {
            self.cancel_scheduled_task_for_participation_lifecycle(
                exercise_id,
                participation_id,
                lifecycle,
            );
        }
    }

    /// Cancel and forget everything. Meant for tests.
    pub fn clear_all_tasks(&self) {
        self.state.clear();
        tracing::debug!("cleared all scheduled tasks");
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Scheduled exercise events sorted by projected fire time.
    pub fn find_all_exercise_events(&self, page: PageRequest) -> Page<ScheduledExerciseEvent> {
        let mut events: Vec<ScheduledExerciseEvent> = self
            .state
            .exercise_tasks
            .snapshot()
            .into_iter()
            .flat_map(|(key, handles)| {
                handles.into_iter().map(move |handle| ScheduledExerciseEvent {
                    exercise_id: key.exercise_id,
                    lifecycle: key.lifecycle,
                    name: handle.name().to_string(),
                    scheduled_time: handle.projected_fire_time(),
                    state: handle.state(),
                })
            })
            .collect();
        sort_by_scheduled_time(&mut events);
        paginate(events, page)
    }

    /// Scheduled participation events sorted by projected fire time.
    pub fn find_all_participation_events(
        &self,
        page: PageRequest,
    ) -> Page<ScheduledParticipationEvent> {
        let mut events: Vec<ScheduledParticipationEvent> = self
            .state
            .participation_tasks
            .snapshot()
            .into_iter()
            .flat_map(|(key, handles)| {
                handles
                    .into_iter()
                    .map(move |handle| ScheduledParticipationEvent {
                        exercise_id: key.exercise_id,
                        participation_id: key.participation_id,
                        lifecycle: key.lifecycle,
                        name: handle.name().to_string(),
                        scheduled_time: handle.projected_fire_time(),
                        state: handle.state(),
                    })
            })
            .collect();
        sort_by_scheduled_time(&mut events);
        paginate(events, page)
    }

    /// Scheduled slide events sorted by projected fire time.
    pub fn find_all_slide_events(&self, page: PageRequest) -> Page<ScheduledSlideEvent> {
        let mut events: Vec<ScheduledSlideEvent> = self
            .state
            .slide_tasks
            .snapshot()
            .into_iter()
            .flat_map(|(key, handles)| {
                handles.into_iter().map(move |handle| ScheduledSlideEvent {
                    slide_id: key.slide_id,
                    lifecycle: key.lifecycle,
                    name: handle.name().to_string(),
                    scheduled_time: handle.projected_fire_time(),
                    state: handle.state(),
                })
            })
            .collect();
        sort_by_scheduled_time(&mut events);
        paginate(events, page)
    }
}

fn require_id(id: Option<EntityId>, kind: EntityKind) -> SchedulerResult<EntityId> {
    id.ok_or(SchedulerError::MissingEntityId { kind })
}

fn cancel_all(handles: &HandleSet) {
    for handle in handles {
        handle.cancel();
    }
}

/// Register `handles` under `key`. Slots without any fire time stay absent.
fn store<K>(registry: &TaskRegistry<K>, key: K, handles: HandleSet)
where
    K: Eq + std::hash::Hash + Clone,
{
    if !handles.is_empty() {
        registry.put(key, handles);
    }
}
