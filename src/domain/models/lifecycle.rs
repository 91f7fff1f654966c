//! Lifecycle phases and the keys that group scheduled work.
//!
//! Every scheduled handle belongs to exactly one lifecycle slot: an entity
//! (exercise, participation or slide) combined with one of its phases. Keys
//! are plain values, rebuilt on every call and compared field by field.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Primary key of a domain entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub i64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Kind of entity a lifecycle key refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Exercise,
    Participation,
    Slide,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exercise => "exercise",
            Self::Participation => "participation",
            Self::Slide => "slide",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time-based phases of an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExerciseLifecycle {
    Release,
    Start,
    Due,
    AssessmentDue,
    BuildAndTestAfterDueDate,
}

impl ExerciseLifecycle {
    /// All exercise phases, in chronological order.
    pub const ALL: [Self; 5] = [
        Self::Release,
        Self::Start,
        Self::Due,
        Self::AssessmentDue,
        Self::BuildAndTestAfterDueDate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Release => "RELEASE",
            Self::Start => "START",
            Self::Due => "DUE",
            Self::AssessmentDue => "ASSESSMENT_DUE",
            Self::BuildAndTestAfterDueDate => "BUILD_AND_TEST_AFTER_DUE_DATE",
        }
    }

    /// The participation phase that individual overrides of this phase are
    /// scheduled under, if any.
    ///
    /// Cancelling an exercise phase with a counterpart also cancels the
    /// counterpart for every participation of that exercise.
    pub fn participation_lifecycle(&self) -> Option<ParticipationLifecycle> {
        match self {
            Self::Due => Some(ParticipationLifecycle::Due),
            Self::BuildAndTestAfterDueDate => Some(ParticipationLifecycle::BuildAndTestAfterDueDate),
            Self::Release | Self::Start | Self::AssessmentDue => None,
        }
    }
}

impl fmt::Display for ExerciseLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time-based phases of a single participation (individual due dates).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipationLifecycle {
    Due,
    BuildAndTestAfterDueDate,
}

impl ParticipationLifecycle {
    pub const ALL: [Self; 2] = [Self::Due, Self::BuildAndTestAfterDueDate];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Due => "DUE",
            Self::BuildAndTestAfterDueDate => "BUILD_AND_TEST_AFTER_DUE_DATE",
        }
    }
}

impl fmt::Display for ParticipationLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time-based phases of a lecture slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlideLifecycle {
    Unhide,
}

impl SlideLifecycle {
    pub const ALL: [Self; 1] = [Self::Unhide];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unhide => "UNHIDE",
        }
    }
}

impl fmt::Display for SlideLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExerciseLifecycleKey {
    pub exercise_id: EntityId,
    pub lifecycle: ExerciseLifecycle,
}

impl ExerciseLifecycleKey {
    pub fn new(exercise_id: EntityId, lifecycle: ExerciseLifecycle) -> Self {
        Self {
            exercise_id,
            lifecycle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipationLifecycleKey {
    pub exercise_id: EntityId,
    pub participation_id: EntityId,
    pub lifecycle: ParticipationLifecycle,
}

impl ParticipationLifecycleKey {
    pub fn new(
        exercise_id: EntityId,
        participation_id: EntityId,
        lifecycle: ParticipationLifecycle,
    ) -> Self {
        Self {
            exercise_id,
            participation_id,
            lifecycle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlideLifecycleKey {
    pub slide_id: EntityId,
    pub lifecycle: SlideLifecycle,
}

impl SlideLifecycleKey {
    pub fn new(slide_id: EntityId, lifecycle: SlideLifecycle) -> Self {
        Self {
            slide_id,
            lifecycle,
        }
    }
}

/// Any lifecycle slot the scheduler tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LifecycleKey {
    Exercise(ExerciseLifecycleKey),
    Participation(ParticipationLifecycleKey),
    Slide(SlideLifecycleKey),
}

impl LifecycleKey {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Exercise(_) => EntityKind::Exercise,
            Self::Participation(_) => EntityKind::Participation,
            Self::Slide(_) => EntityKind::Slide,
        }
    }

    /// Lifecycle phase name, independent of the entity kind.
    pub fn lifecycle_name(&self) -> &'static str {
        match self {
            Self::Exercise(key) => key.lifecycle.as_str(),
            Self::Participation(key) => key.lifecycle.as_str(),
            Self::Slide(key) => key.lifecycle.as_str(),
        }
    }
}

impl fmt::Display for LifecycleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exercise(key) => {
                write!(f, "exercise {} ({})", key.exercise_id, key.lifecycle)
            }
            Self::Participation(key) => write!(
                f,
                "participation {} of exercise {} ({})",
                key.participation_id, key.exercise_id, key.lifecycle
            ),
            Self::Slide(key) => write!(f, "slide {} ({})", key.slide_id, key.lifecycle),
        }
    }
}

impl From<ExerciseLifecycleKey> for LifecycleKey {
    fn from(key: ExerciseLifecycleKey) -> Self {
        Self::Exercise(key)
    }
}

impl From<ParticipationLifecycleKey> for LifecycleKey {
    fn from(key: ParticipationLifecycleKey) -> Self {
        Self::Participation(key)
    }
}

impl From<SlideLifecycleKey> for LifecycleKey {
    fn from(key: SlideLifecycleKey) -> Self {
        Self::Slide(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_keys_compare_by_value() {
        let a = ExerciseLifecycleKey::new(EntityId(42), ExerciseLifecycle::Due);
        let b = ExerciseLifecycleKey::new(EntityId(42), ExerciseLifecycle::Due);
        let c = ExerciseLifecycleKey::new(EntityId(42), ExerciseLifecycle::Release);
        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.contains(&c));
    }

    #[test]
    fn test_variant_tag_is_part_of_identity() {
        let exercise: LifecycleKey =
            ExerciseLifecycleKey::new(EntityId(7), ExerciseLifecycle::Release).into();
        let slide: LifecycleKey = SlideLifecycleKey::new(EntityId(7), SlideLifecycle::Unhide).into();
        assert_ne!(exercise, slide);
        assert_eq!(exercise.kind(), EntityKind::Exercise);
        assert_eq!(slide.kind(), EntityKind::Slide);
    }

    #[test]
    fn test_cascade_mapping() {
        assert_eq!(
            ExerciseLifecycle::Due.participation_lifecycle(),
            Some(ParticipationLifecycle::Due)
        );
        assert_eq!(
            ExerciseLifecycle::BuildAndTestAfterDueDate.participation_lifecycle(),
            Some(ParticipationLifecycle::BuildAndTestAfterDueDate)
        );
        assert_eq!(ExerciseLifecycle::Release.participation_lifecycle(), None);
        assert_eq!(ExerciseLifecycle::Start.participation_lifecycle(), None);
        assert_eq!(ExerciseLifecycle::AssessmentDue.participation_lifecycle(), None);
    }

    #[test]
    fn test_display() {
        let key: LifecycleKey =
            ParticipationLifecycleKey::new(EntityId(1), EntityId(9), ParticipationLifecycle::Due)
                .into();
        assert_eq!(key.to_string(), "participation 9 of exercise 1 (DUE)");
        assert_eq!(key.lifecycle_name(), "DUE");
    }

    #[test]
    fn test_serde_lifecycle_names() {
        let json = serde_json::to_string(&ExerciseLifecycle::BuildAndTestAfterDueDate).unwrap();
        assert_eq!(json, "\"BUILD_AND_TEST_AFTER_DUE_DATE\"");
        let parsed: SlideLifecycle = serde_json::from_str("\"UNHIDE\"").unwrap();
        assert_eq!(parsed, SlideLifecycle::Unhide);
    }
}
