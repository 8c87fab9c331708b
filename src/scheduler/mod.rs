//! Scheduling facade and schedule statistics.
//!
//! # Facade
//!
//! `ProductionScheduler` collects jobs and machines, runs the CP pipeline
//! (build, solve, extract) under a time budget, and exposes validation and
//! statistics for the result.
//!
//! # Statistics
//!
//! `ScheduleStatistics` computes makespan, per-machine utilization and
//! load, and per-job spans.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3-4
//! - Baker & Trietsch (2019), "Principles of Sequencing and Scheduling"

mod production;
mod stats;

pub use production::{ProductionScheduler, SolveOutcome};
pub use stats::ScheduleStatistics;
