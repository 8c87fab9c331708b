//! Job model.
//!
//! A job is an ordered chain of operations. Each operation is identified
//! only by its type tag (e.g. "cutting"); the order of the tags is the
//! required execution sequence.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 1

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::TimeOrigin;

/// A multi-step manufacturing job.
///
/// # Time Representation
/// `release_date` and `due_date` are integer minute offsets from the
/// planning origin (t=0). Use [`TimeOrigin`] to convert wall-clock
/// timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier.
    pub id: String,
    /// Operation type tags in required execution order.
    pub operations: Vec<String>,
    /// Earliest start offset (minutes) for the first operation.
    #[serde(default)]
    pub release_date: i64,
    /// Latest completion offset (minutes). `None` = no due date.
    #[serde(default)]
    pub due_date: Option<i64>,
    /// Scheduling priority (higher = more important). Reserved: not part
    /// of the makespan objective.
    #[serde(default)]
    pub priority: i32,
}

/// Reference to a single operation of a job: `(job_id, operation_index)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationInstance<'a> {
    /// Owning job identifier.
    pub job_id: &'a str,
    /// Position within the job (0-indexed).
    pub operation_index: usize,
    /// Operation type tag (`job.operations[operation_index]`).
    pub operation_type: &'a str,
}

impl Job {
    /// Creates a new job with no operations, released at t=0.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            operations: Vec::new(),
            release_date: 0,
            due_date: None,
            priority: 0,
        }
    }

    /// Appends an operation to the end of the sequence.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operations.push(operation.into());
        self
    }

    /// Appends several operations in order.
    pub fn with_operations<I, S>(mut self, operations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.operations.extend(operations.into_iter().map(Into::into));
        self
    }

    /// Sets the release offset (minutes).
    pub fn with_release_date(mut self, release_minutes: i64) -> Self {
        self.release_date = release_minutes;
        self
    }

    /// Sets the due offset (minutes).
    pub fn with_due_date(mut self, due_minutes: i64) -> Self {
        self.due_date = Some(due_minutes);
        self
    }

    /// Sets the release from a wall-clock timestamp.
    pub fn with_release_at(self, origin: &TimeOrigin, at: NaiveDateTime) -> Self {
        self.with_release_date(origin.to_offset(at))
    }

    /// Sets the due date from a wall-clock timestamp.
    pub fn with_due_at(self, origin: &TimeOrigin, at: NaiveDateTime) -> Self {
        self.with_due_date(origin.to_offset(at))
    }

    /// Sets the scheduling priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Number of operations.
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    /// Whether this job has any operations.
    pub fn has_operations(&self) -> bool {
        !self.operations.is_empty()
    }

    /// Iterates the derived operation instances in sequence order.
    pub fn operation_instances(&self) -> impl Iterator<Item = OperationInstance<'_>> {
        self.operations
            .iter()
            .enumerate()
            .map(move |(operation_index, op)| OperationInstance {
                job_id: &self.id,
                operation_index,
                operation_type: op,
            })
    }
}
