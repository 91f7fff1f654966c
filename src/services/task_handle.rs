//! Cancellable handle to one unit of scheduled work.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use tokio::task::AbortHandle;
use uuid::Uuid;

use crate::domain::models::TaskState;

/// Shared state between a handle and the engine task driving it.
pub(crate) struct HandleInner {
    state: AtomicU8,
    cancel_requested: AtomicBool,
    /// Next fire instant, unix millis.
    fire_at_millis: AtomicI64,
    abort: OnceLock<AbortHandle>,
}

impl HandleInner {
    pub(crate) fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Compare-and-swap the state. Returns whether `from` was current.
    ///
    /// SeqCst together with the cancel flag: a cancel that saw `Running` is
    /// visible to whoever moves the handle out of `Running` afterwards.
    pub(crate) fn transition(&self, from: TaskState, to: TaskState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub(crate) fn set_state(&self, state: TaskState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub(crate) fn cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }

    pub(crate) fn set_fire_time(&self, fire_at: DateTime<Utc>) {
        self.fire_at_millis
            .store(fire_at.timestamp_millis(), Ordering::Release);
    }
}

/// A scheduled unit of work: identity, name, projected fire time and state.
///
/// Cloning is cheap and every clone observes the same state. Handles compare
/// and hash by their id, so they can be kept in sets.
#[derive(Clone)]
pub struct ScheduledTaskHandle {
    id: Uuid,
    name: Arc<str>,
    inner: Arc<HandleInner>,
}

impl ScheduledTaskHandle {
    pub(crate) fn new(name: impl Into<String>, fire_at: DateTime<Utc>) -> Self {
        let name: String = name.into();
        Self {
            id: Uuid::new_v4(),
            name: Arc::from(name),
            inner: Arc::new(HandleInner {
                state: AtomicU8::new(TaskState::Pending as u8),
                cancel_requested: AtomicBool::new(false),
                fire_at_millis: AtomicI64::new(fire_at.timestamp_millis()),
                abort: OnceLock::new(),
            }),
        }
    }

    pub(crate) fn inner(&self) -> &HandleInner {
        &self.inner
    }

    pub(crate) fn attach(&self, abort: AbortHandle) {
        // A handle is attached exactly once, right after spawning.
        let _ = self.inner.abort.set(abort);
        // Cancelled between spawn and attach: make sure the timer goes away.
        if self.state() == TaskState::Cancelled {
            if let Some(abort) = self.inner.abort.get() {
                abort.abort();
            }
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> TaskState {
        self.inner.state()
    }

    /// Next instant at which the work is due.
    pub fn fire_time(&self) -> DateTime<Utc> {
        let millis = self.inner.fire_at_millis.load(Ordering::Acquire);
        DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
    }

    /// Remaining delay until the fire time. Negative once it has passed.
    pub fn delay(&self) -> chrono::Duration {
        self.fire_time() - Utc::now()
    }

    /// Current instant plus the remaining delay.
    pub fn projected_fire_time(&self) -> DateTime<Utc> {
        Utc::now() + self.delay()
    }

    /// Request cancellation.
    ///
    /// A pending handle becomes `Cancelled` and its timer is dropped; returns
    /// `true` in that case. A running work body is not interrupted, and
    /// terminal handles are left untouched; both return `false`.
    pub fn cancel(&self) -> bool {
        self.inner.cancel_requested.store(true, Ordering::SeqCst);
        if self.inner.transition(TaskState::Pending, TaskState::Cancelled) {
            if let Some(abort) = self.inner.abort.get() {
                abort.abort();
            }
            true
        } else {
            false
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == TaskState::Cancelled
    }

    pub fn is_done(&self) -> bool {
        self.state().is_terminal()
    }
}

impl PartialEq for ScheduledTaskHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ScheduledTaskHandle {}

impl Hash for ScheduledTaskHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ScheduledTaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledTaskHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("fire_time", &self.fire_time())
            .field("state", &self.state())
            .finish()
    }
}
