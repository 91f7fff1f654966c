use chrono::{Duration, TimeZone, Utc};
use lifecycle_scheduler::domain::models::scheduled_event::sort_by_scheduled_time;
use lifecycle_scheduler::domain::models::{paginate, PageRequest};
use lifecycle_scheduler::{EntityId, ExerciseLifecycle, ScheduledExerciseEvent, TaskState};
use proptest::prelude::*;

fn event(id: i64, offset_secs: i64) -> ScheduledExerciseEvent {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    ScheduledExerciseEvent {
        exercise_id: EntityId(id),
        lifecycle: ExerciseLifecycle::Release,
        name: format!("release-{id}"),
        scheduled_time: base + Duration::seconds(offset_secs),
        state: TaskState::Pending,
    }
}

proptest! {
    /// Property: pages partition the sorted list
    ///
    /// Concatenating every page in order reproduces the full list exactly once.
    #[test]
    fn prop_pages_partition_list(
        offsets in prop::collection::vec(0i64..10_000, 0..60),
        size in 1usize..12
    ) {
        let mut events: Vec<_> = offsets
            .iter()
            .enumerate()
            .map(|(i, &offset)| event(i as i64, offset))
            .collect();
        sort_by_scheduled_time(&mut events);

        let total_pages = events.len().div_ceil(size);
        let mut collected = Vec::new();
        for page in 0..total_pages {
            let result = paginate(events.clone(), PageRequest::new(page, size).unwrap());
            prop_assert_eq!(result.total_elements, events.len());
            prop_assert_eq!(result.total_pages, total_pages);
            prop_assert!(result.len() <= size);
            collected.extend(result.items);
        }

        prop_assert_eq!(collected, events);
    }

    /// Property: sorted events are ascending by scheduled time
    #[test]
    fn prop_sorted_events_ascending(
        offsets in prop::collection::vec(-5_000i64..5_000, 0..40)
    ) {
        let mut events: Vec<_> = offsets
            .iter()
            .enumerate()
            .map(|(i, &offset)| event(i as i64, offset))
            .collect();
        sort_by_scheduled_time(&mut events);

        for pair in events.windows(2) {
            prop_assert!(pair[0].scheduled_time <= pair[1].scheduled_time);
        }
    }

    /// Property: any page past the end is empty but still reports totals
    #[test]
    fn prop_page_past_end_is_empty(
        len in 0usize..30,
        size in 1usize..10,
        extra in 0usize..5
    ) {
        let events: Vec<_> = (0..len).map(|i| event(i as i64, i as i64)).collect();
        let past_end = len.div_ceil(size) + extra;

        let result = paginate(events, PageRequest::new(past_end, size).unwrap());

        prop_assert!(result.is_empty());
        prop_assert_eq!(result.total_elements, len);
    }
}

#[test]
fn test_zero_page_size_rejected() {
    assert!(PageRequest::new(0, 0).is_err());
}
