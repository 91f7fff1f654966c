//! Concurrent registries of scheduled handles, keyed by lifecycle slot.
//!
//! Backed by `DashMap`, so API callers, worker threads and the sweep can read
//! and mutate entries concurrently without a registry-wide lock. Callbacks
//! passed to the bulk operations run while a shard lock is held and must not
//! call back into the same registry.

use std::collections::HashSet;
use std::hash::Hash;

use dashmap::DashMap;

use crate::domain::models::{
    ExerciseLifecycleKey, ParticipationLifecycleKey, SlideLifecycleKey,
};
use crate::services::task_handle::ScheduledTaskHandle;

/// Set of handles registered for one lifecycle slot.
pub type HandleSet = HashSet<ScheduledTaskHandle>;

/// Mapping from lifecycle key to the handles scheduled for it.
#[derive(Debug)]
pub struct TaskRegistry<K>
where
    K: Eq + Hash,
{
    entries: DashMap<K, HandleSet>,
}

impl<K> Default for TaskRegistry<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> TaskRegistry<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Replace the handles stored under `key`.
    pub fn put(&self, key: K, handles: HandleSet) {
        self.entries.insert(key, handles);
    }

    /// Handles stored under `key`; empty when absent.
    pub fn get(&self, key: &K) -> HandleSet {
        self.entries
            .get(key)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Remove the entry for `key`, returning its handles. No-op when absent.
    pub fn remove(&self, key: &K) -> Option<HandleSet> {
        self.entries.remove(key).map(|(_, handles)| handles)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of handles across all keys.
    pub fn handle_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.value().len()).sum()
    }

    /// Keys accepted by `predicate`, collected so callers can mutate the
    /// registry afterwards.
    pub fn keys_matching<F>(&self, mut predicate: F) -> Vec<K>
    where
        F: FnMut(&K) -> bool,
    {
        self.entries
            .iter()
            .filter(|entry| predicate(entry.key()))
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Visit every entry.
    pub fn for_each_entry<F>(&self, mut f: F)
    where
        F: FnMut(&K, &HandleSet),
    {
        for entry in self.entries.iter() {
            f(entry.key(), entry.value());
        }
    }

    /// Drop every handle for which `keep` returns false. Returns the number of
    /// handles dropped. Entries left empty stay until [`Self::remove_if`].
    pub fn retain_handles<F>(&self, mut keep: F) -> usize
    where
        F: FnMut(&K, &ScheduledTaskHandle) -> bool,
    {
        let mut dropped = 0;
        for mut entry in self.entries.iter_mut() {
            let (key, handles) = entry.pair_mut();
            let before = handles.len();
            handles.retain(|handle| keep(key, handle));
            dropped += before - handles.len();
        }
        dropped
    }

    /// Remove every entry matching `predicate`. Returns how many were removed.
    ///
    /// The predicate is evaluated under the entry's shard lock, so an entry
    /// replaced concurrently is judged by its new contents.
    pub fn remove_if<F>(&self, mut predicate: F) -> usize
    where
        F: FnMut(&K, &HandleSet) -> bool,
    {
        let mut removed = 0;
        self.entries.retain(|key, handles| {
            let remove = predicate(key, handles);
            removed += usize::from(remove);
            !remove
        });
        removed
    }

    /// Point-in-time copy of all entries.
    pub fn snapshot(&self) -> Vec<(K, Vec<ScheduledTaskHandle>)> {
        self.entries
            .iter()
            .map(|entry| {
                (
                    entry.key().clone(),
                    entry.value().iter().cloned().collect(),
                )
            })
            .collect()
    }

    /// Cancel every handle and empty the registry.
    pub fn cancel_all_and_clear(&self) {
        for key in self.keys_matching(|_| true) {
            if let Some(handles) = self.remove(&key) {
                for handle in &handles {
                    handle.cancel();
                }
            }
        }
    }
}

/// The three registries shared by the scheduling service and the sweep.
///
/// Constructed once at startup and handed to both by `Arc`; a fresh instance
/// is a fresh, empty scheduler state.
#[derive(Debug, Default)]
pub struct SchedulerState {
    pub exercise_tasks: TaskRegistry<ExerciseLifecycleKey>,
    pub participation_tasks: TaskRegistry<ParticipationLifecycleKey>,
    pub slide_tasks: TaskRegistry<SlideLifecycleKey>,
}

impl SchedulerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles across all three registries.
    pub fn handle_count(&self) -> usize {
        self.exercise_tasks.handle_count()
            + self.participation_tasks.handle_count()
            + self.slide_tasks.handle_count()
    }

    /// Cancel everything and empty all registries.
    pub fn clear(&self) {
        self.exercise_tasks.cancel_all_and_clear();
        self.participation_tasks.cancel_all_and_clear();
        self.slide_tasks.cancel_all_and_clear();
    }
}
