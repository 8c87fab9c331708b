//! CP-based scheduling formulation.
//!
//! Builds a [`CpModel`] from jobs and machines, solves it with a
//! [`CpSolver`], and converts the solution back into a
//! [`Schedule`](crate::models::Schedule).
//!
//! # Example
//! ```
//! use u_jobshop::config::OperationDurations;
//! use u_jobshop::cp::{extract_schedule, BranchAndBoundSolver, CpSolver, ScheduleCpBuilder, SolverConfig};
//! use u_jobshop::models::{Job, Machine};
//!
//! let jobs = vec![Job::new("J1").with_operations(["cutting", "welding"])];
//! let machines = vec![Machine::new("M1").with_capabilities(["cutting", "welding"])];
//! let durations = OperationDurations::default();
//!
//! let model = ScheduleCpBuilder::new(&jobs, &machines, &durations).build(1440).unwrap();
//! let solution = BranchAndBoundSolver::new().solve(&model, &SolverConfig::default());
//! let schedule = extract_schedule(&model, &solution).unwrap();
//! assert_eq!(schedule.makespan, 105);
//! ```
//!
//! # Reference
//! - Laborie et al. (2018), "IBM ILOG CP Optimizer for Scheduling"
//! - Baptiste et al. (2001), "Constraint-Based Scheduling"

mod builder;
mod extract;
mod heuristic;
mod model;
mod propagation;
mod solver;
mod variables;

pub use builder::ScheduleCpBuilder;
pub use extract::extract_schedule;
pub use model::{CandidateSlot, Constraint, CpModel, JobRecord, OperationNode, SlotRef};
pub use solver::{
    BranchAndBoundSolver, CpSolution, CpSolver, SlotAssignment, SolverConfig, SolverStatus,
};
pub use variables::{IntVar, IntervalVar, PresenceLit};
