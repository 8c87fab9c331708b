//! Scheduling domain models.
//!
//! Provides the value types for flexible job-shop problems and their
//! solutions. Jobs and machines are supplied by the caller; schedules are
//! produced fresh by each solve and are immutable afterwards.
//!
//! # Domain Mappings
//!
//! | u-jobshop | Shop floor | Scheduling theory |
//! |-----------|------------|-------------------|
//! | Job | Production order | Job J_j |
//! | Operation | Process step | O_ij |
//! | Machine | Work center | Machine M_k |
//! | Schedule | Production plan | (assignment, sequence) |

mod calendar;
mod job;
mod machine;
mod schedule;

pub use calendar::{TimeOrigin, TimeWindow, NOMINAL_START_HOUR};
pub use job::{Job, OperationInstance};
pub use machine::Machine;
pub use schedule::{Assignment, JobSchedule, Schedule};
