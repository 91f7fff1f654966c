//! Domain ports (interfaces to callers' entities).

pub mod schedulable;

pub use schedulable::{work, ParticipationSchedulable, Schedulable, Work};
