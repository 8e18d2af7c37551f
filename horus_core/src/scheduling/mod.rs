//! Scheduling: the fixed-rate priority loop that drives node lifecycles.

pub mod scheduler;

pub use scheduler::{Priority, Scheduler, SchedulerStopHandle, DEFAULT_RATE_HZ};
