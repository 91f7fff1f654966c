//! Domain layer for the lifecycle scheduler
//!
//! This module contains the lifecycle keys, read models and the ports
//! through which callers describe their entities.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{SchedulerError, SchedulerResult};
