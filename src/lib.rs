//! Flexible job-shop scheduling engine.
//!
//! Assigns multi-step manufacturing jobs to capability-limited machines,
//! choosing a machine and a start time for every operation so that job
//! order is respected, no machine runs two operations at once, and the
//! makespan is minimized within a time budget.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Job`, `Machine`, `OperationInstance`,
//!   `Schedule`, `JobSchedule`, `Assignment`, `TimeOrigin`
//! - **`cp`**: Constraint model builder, branch-and-bound solver, extractor
//! - **`validation`**: Independent schedule checks
//! - **`scheduler`**: `ProductionScheduler` facade and schedule statistics
//! - **`config`**: `SchedulerConfig` and the operation duration table
//! - **`error`**: `ConfigurationError` and `ScheduleError`
//!
//! # Logging
//!
//! The crate emits `tracing` events under a span supplied by the caller
//! (`ProductionScheduler::with_span`) and never installs a subscriber.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Brucker (2007), "Scheduling Algorithms"
//! - Brandimarte (1993), "Routing and scheduling in a flexible job shop by tabu search"

pub mod config;
pub mod cp;
pub mod error;
pub mod models;
pub mod scheduler;
pub mod validation;

pub use config::{OperationDurations, SchedulerConfig};
pub use error::{ConfigurationError, Result, ScheduleError};
pub use scheduler::{ProductionScheduler, ScheduleStatistics, SolveOutcome};
pub use validation::{ScheduleValidator, ValidationReport};
