//! Error types.
//!
//! Model-construction problems abort an optimize call before any search
//! starts. Search outcomes that produce no schedule are returned as a
//! status and only become errors when the caller asks for the schedule.

use thiserror::Error;

/// A problem instance that cannot be compiled into a constraint model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("No compatible machine for operation {operation} (index {operation_index}) of job {job_id}")]
    NoCompatibleMachine {
        job_id: String,
        operation_index: usize,
        operation: String,
    },

    #[error("No base duration configured for operation type {0}")]
    UnknownOperationType(String),

    #[error("Negative base duration {minutes} for operation type {operation}")]
    NegativeDuration { operation: String, minutes: i64 },

    #[error("Machine {machine_id} has invalid efficiency factor {factor}")]
    InvalidEfficiency { machine_id: String, factor: f64 },

    #[error("Duplicate job ID: {0}")]
    DuplicateJob(String),

    #[error("Duplicate machine ID: {0}")]
    DuplicateMachine(String),

    #[error("Job {0} has no operations")]
    EmptyJob(String),

    #[error("Planning horizon must be positive, got {0}")]
    InvalidHorizon(i64),
}

/// Top-level error for the scheduling engine.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Infeasible schedule: {0}")]
    Infeasible(String),

    #[error("Time budget exhausted without a feasible schedule after {nodes} search nodes")]
    BudgetExhausted { nodes: u64 },

    #[error("Config file error: {0}")]
    ConfigFile(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
