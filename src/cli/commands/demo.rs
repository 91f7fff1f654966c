//! Demo command: drives the scheduler end to end with synthetic exercises.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

use crate::cli::display::{action_success, list_table, render_list};
use crate::cli::output::{output, truncate, CommandOutput};
use crate::domain::models::{
    Config, EntityId, ExerciseLifecycle, Page, PageRequest, ScheduledExerciseEvent,
};
use crate::domain::ports::{work, Schedulable};
use crate::services::{
    LifecycleScheduleService, SchedulerEngine, SchedulerState, SweepReport, SweepTask,
};

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Number of synthetic exercises to schedule
    #[arg(short = 'n', long, default_value_t = 5)]
    pub exercises: u32,

    /// Gap between consecutive release times, in milliseconds
    #[arg(long, default_value_t = 200)]
    pub spacing_ms: u64,

    /// Page of the event listing (zero-based)
    #[arg(long, default_value_t = 0)]
    pub page: usize,

    /// Events per page
    #[arg(long, default_value_t = 20)]
    pub size: usize,
}

/// Synthetic exercise with a release date and an optional due date.
#[derive(Debug, Clone)]
struct DemoExercise {
    id: EntityId,
    release_date: DateTime<Utc>,
    due_date: Option<DateTime<Utc>>,
}

impl Schedulable<ExerciseLifecycle> for DemoExercise {
    fn entity_id(&self) -> Option<EntityId> {
        Some(self.id)
    }

    fn fire_times(&self, lifecycle: ExerciseLifecycle) -> Vec<DateTime<Utc>> {
        match lifecycle {
            ExerciseLifecycle::Release => vec![self.release_date],
            ExerciseLifecycle::Due => self.due_date.into_iter().collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct EventRow {
    exercise_id: i64,
    lifecycle: String,
    name: String,
    scheduled_time: DateTime<Utc>,
    state: String,
}

impl From<&ScheduledExerciseEvent> for EventRow {
    fn from(event: &ScheduledExerciseEvent) -> Self {
        Self {
            exercise_id: event.exercise_id.0,
            lifecycle: event.lifecycle.to_string(),
            name: event.name.clone(),
            scheduled_time: event.scheduled_time,
            state: event.state.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct EventListOutput {
    events: Vec<EventRow>,
    page: usize,
    size: usize,
    total_elements: usize,
    total_pages: usize,
}

impl From<Page<ScheduledExerciseEvent>> for EventListOutput {
    fn from(page: Page<ScheduledExerciseEvent>) -> Self {
        Self {
            events: page.items.iter().map(EventRow::from).collect(),
            page: page.page,
            size: page.size,
            total_elements: page.total_elements,
            total_pages: page.total_pages,
        }
    }
}

impl CommandOutput for EventListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["exercise", "lifecycle", "name", "scheduled", "state"]);
        for event in &self.events {
            table.add_row(vec![
                event.exercise_id.to_string(),
                event.lifecycle.clone(),
                truncate(&event.name, 32),
                event.scheduled_time.format("%H:%M:%S%.3f").to_string(),
                event.state.clone(),
            ]);
        }
        let mut rendered = render_list("scheduled event", table, self.events.len());
        if self.total_pages > 1 {
            rendered.push_str(&format!(
                "\nPage {} of {} ({} total)",
                self.page + 1,
                self.total_pages,
                self.total_elements
            ));
        }
        rendered
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
struct DemoSummaryOutput {
    fired: usize,
    pruned: usize,
    entries_removed: usize,
    remaining_handles: usize,
}

impl DemoSummaryOutput {
    fn new(fired: usize, report: &SweepReport, remaining_handles: usize) -> Self {
        Self {
            fired,
            pruned: report.total_pruned(),
            entries_removed: report.total_entries_removed(),
            remaining_handles,
        }
    }
}

impl CommandOutput for DemoSummaryOutput {
    fn to_human(&self) -> String {
        action_success(&format!(
            "{} task(s) fired, sweep pruned {} handle(s) and removed {} entr{}; {} handle(s) left",
            self.fired,
            self.pruned,
            self.entries_removed,
            if self.entries_removed == 1 { "y" } else { "ies" },
            self.remaining_handles
        ))
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Release and due instants of the `n`-th exercise: released `n` spacings
/// from `now`, due ten times as far out.
fn demo_dates(
    now: DateTime<Utc>,
    spacing_ms: u64,
    n: u32,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let at = |factor: u64| {
        spacing_ms
            .checked_mul(u64::from(n))
            .and_then(|ms| ms.checked_mul(factor))
            .and_then(|ms| i64::try_from(ms).ok())
            .and_then(chrono::Duration::try_milliseconds)
            .and_then(|offset| now.checked_add_signed(offset))
            .ok_or_else(|| anyhow!("--spacing-ms {spacing_ms} puts exercise {n} out of range"))
    };
    Ok((at(1)?, at(10)?))
}

/// How long to wait for every release to fire: one spacing past the last
/// release plus a small margin.
fn settle_time(spacing_ms: u64, exercises: u32) -> Result<Duration> {
    exercises
        .checked_add(1)
        .and_then(|slots| Duration::from_millis(spacing_ms).checked_mul(slots))
        .and_then(|wait| wait.checked_add(Duration::from_millis(100)))
        .ok_or_else(|| {
            anyhow!("--spacing-ms {spacing_ms} with {exercises} exercises is out of range")
        })
}

pub async fn execute(args: DemoArgs, config: &Config, json_mode: bool) -> Result<()> {
    let page_request =
        PageRequest::new(args.page, args.size).context("Invalid page request")?;

    let engine = Arc::new(
        SchedulerEngine::new(&config.scheduler).context("Failed to create scheduler engine")?,
    );
    let state = Arc::new(SchedulerState::new());
    let sweep = SweepTask::new(Arc::clone(&state))
        .start(&engine, &config.scheduler)
        .context("Failed to start registry sweep")?;
    let service = LifecycleScheduleService::new(Arc::clone(&engine), Arc::clone(&state));

    let fired = Arc::new(AtomicUsize::new(0));
    let wait = settle_time(args.spacing_ms, args.exercises)?;
    let now = Utc::now();

    for n in 1..=args.exercises {
        let (release_date, due_date) = demo_dates(now, args.spacing_ms, n)?;
        let exercise = DemoExercise {
            id: EntityId(i64::from(n)),
            release_date,
            due_date: Some(due_date),
        };

        let counter = Arc::clone(&fired);
        let exercise_id = exercise.id;
        service
            .schedule_task(
                &exercise,
                ExerciseLifecycle::Release,
                format!("release-exercise-{exercise_id}"),
                work(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tracing::info!(exercise_id = %exercise_id, "exercise released");
                }),
            )
            .with_context(|| format!("Failed to schedule release of exercise {exercise_id}"))?;
        service
            .schedule_task(
                &exercise,
                ExerciseLifecycle::Due,
                format!("due-exercise-{exercise_id}"),
                work(move || tracing::info!(exercise_id = %exercise_id, "exercise due")),
            )
            .with_context(|| format!("Failed to schedule due date of exercise {exercise_id}"))?;
    }

    let listing = EventListOutput::from(service.find_all_exercise_events(page_request));
    output(&listing, json_mode);

    // Wait for every release, then drop the due dates before they fire.
    tokio::time::sleep(wait).await;
    for n in 1..=args.exercises {
        service.cancel_scheduled_task_for_lifecycle(EntityId(i64::from(n)), ExerciseLifecycle::Due);
    }

    let report = sweep.run_now();
    let summary = DemoSummaryOutput::new(
        fired.load(Ordering::SeqCst),
        &report,
        state.handle_count(),
    );
    output(&summary, json_mode);

    sweep.stop();
    service.clear_all_tasks();
    engine.shutdown();
    Ok(())
}
