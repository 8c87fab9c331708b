//! Schedule (solution) model.
//!
//! A schedule assigns every operation of every job to one machine and one
//! time interval. The serialized form is the wire shape consumed by
//! rendering and reporting collaborators:
//!
//! ```text
//! { makespan, jobs: [ { job_id, operations: [ { operation, machine, start_time, end_time } ] } ] }
//! ```
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3

use serde::{Deserialize, Serialize};

use super::TimeWindow;

/// A complete schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Latest end time across all assignments (minutes).
    pub makespan: i64,
    /// Per-job assignment lists, in job order.
    pub jobs: Vec<JobSchedule>,
}

/// The assignments of one job, in operation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSchedule {
    /// Job identifier.
    pub job_id: String,
    /// One assignment per operation, indexed by operation position.
    pub operations: Vec<Assignment>,
}

/// An operation-machine-time assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Operation type tag.
    pub operation: String,
    /// Assigned machine identifier.
    pub machine: String,
    /// Start offset (minutes, inclusive).
    pub start_time: i64,
    /// End offset (minutes, exclusive).
    pub end_time: i64,
}

impl Assignment {
    /// Creates a new assignment.
    pub fn new(
        operation: impl Into<String>,
        machine: impl Into<String>,
        start_time: i64,
        end_time: i64,
    ) -> Self {
        Self {
            operation: operation.into(),
            machine: machine.into(),
            start_time,
            end_time,
        }
    }

    /// Processing duration (end - start) in minutes.
    #[inline]
    pub fn duration(&self) -> i64 {
        self.end_time.saturating_sub(self.start_time)
    }

    /// The occupied interval `[start_time, end_time)`.
    #[inline]
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start_time, self.end_time)
    }
}

impl JobSchedule {
    /// Creates an empty job schedule.
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            operations: Vec::new(),
        }
    }

    /// Appends an assignment.
    pub fn with_assignment(mut self, assignment: Assignment) -> Self {
        self.operations.push(assignment);
        self
    }

    /// First start time, if any operation is assigned.
    pub fn start_time(&self) -> Option<i64> {
        self.operations.iter().map(|a| a.start_time).min()
    }

    /// Completion time (latest end), if any operation is assigned.
    pub fn completion_time(&self) -> Option<i64> {
        self.operations.iter().map(|a| a.end_time).max()
    }

    /// Time from first start to last end.
    pub fn span(&self) -> Option<i64> {
        Some(self.completion_time()? - self.start_time()?)
    }
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a job schedule.
    pub fn add_job(&mut self, job: JobSchedule) {
        self.jobs.push(job);
    }

    /// Builder-style [`add_job`](Self::add_job).
    pub fn with_job(mut self, job: JobSchedule) -> Self {
        self.add_job(job);
        self
    }

    /// Sets `makespan` to the latest end time across all assignments.
    pub fn with_computed_makespan(mut self) -> Self {
        self.makespan = self.max_end_time();
        self
    }

    /// Latest end time across all assignments (0 if empty).
    pub fn max_end_time(&self) -> i64 {
        self.assignments()
            .map(|(_, a)| a.end_time)
            .max()
            .unwrap_or(0)
    }

    /// Finds the schedule of a job.
    pub fn job(&self, job_id: &str) -> Option<&JobSchedule> {
        self.jobs.iter().find(|j| j.job_id == job_id)
    }

    /// Iterates all assignments with their owning job id.
    pub fn assignments(&self) -> impl Iterator<Item = (&str, &Assignment)> {
        self.jobs
            .iter()
            .flat_map(|j| j.operations.iter().map(move |a| (j.job_id.as_str(), a)))
    }

    /// Returns all assignments on a given machine, sorted by start time.
    pub fn assignments_for_machine(&self, machine_id: &str) -> Vec<(&str, &Assignment)> {
        let mut on_machine: Vec<_> = self
            .assignments()
            .filter(|(_, a)| a.machine == machine_id)
            .collect();
        on_machine.sort_by_key(|(_, a)| (a.start_time, a.end_time));
        on_machine
    }

    /// Number of assignments.
    pub fn assignment_count(&self) -> usize {
        self.jobs.iter().map(|j| j.operations.len()).sum()
    }

    /// Whether the schedule has no assignments.
    pub fn is_empty(&self) -> bool {
        self.assignment_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schedule() -> Schedule {
        Schedule::new()
            .with_job(
                JobSchedule::new("J1")
                    .with_assignment(Assignment::new("cutting", "M1", 0, 45))
                    .with_assignment(Assignment::new("welding", "M2", 45, 105)),
            )
            .with_job(
                JobSchedule::new("J2").with_assignment(Assignment::new("cutting", "M1", 45, 90)),
            )
            .with_computed_makespan()
    }

    #[test]
    fn test_schedule_makespan() {
        let s = sample_schedule();
        assert_eq!(s.makespan, 105);
        assert_eq!(s.max_end_time(), 105);
    }

    #[test]
    fn test_assignment_duration() {
        let a = Assignment::new("assembly", "M2", 100, 190);
        assert_eq!(a.duration(), 90);
        assert_eq!(a.window(), TimeWindow::new(100, 190));
    }

    #[test]
    fn test_assignments_for_machine_sorted() {
        let s = sample_schedule();
        let m1 = s.assignments_for_machine("M1");
        assert_eq!(m1.len(), 2);
        assert_eq!(m1[0].0, "J1");
        assert_eq!(m1[1].0, "J2");
        assert!(s.assignments_for_machine("M9").is_empty());
    }

    #[test]
    fn test_job_span() {
        let s = sample_schedule();
        let j1 = s.job("J1").unwrap();
        assert_eq!(j1.start_time(), Some(0));
        assert_eq!(j1.completion_time(), Some(105));
        assert_eq!(j1.span(), Some(105));
        assert!(s.job("J9").is_none());
        assert_eq!(JobSchedule::new("empty").span(), None);
    }

    #[test]
    fn test_empty_schedule() {
        let s = Schedule::new();
        assert_eq!(s.makespan, 0);
        assert_eq!(s.assignment_count(), 0);
        assert!(s.is_empty());
    }

    #[test]
    fn test_wire_shape() {
        let s = sample_schedule();
        let value = serde_json::to_value(&s).unwrap();

        assert_eq!(value["makespan"], 105);
        assert_eq!(value["jobs"][0]["job_id"], "J1");
        let op = &value["jobs"][0]["operations"][1];
        assert_eq!(op["operation"], "welding");
        assert_eq!(op["machine"], "M2");
        assert_eq!(op["start_time"], 45);
        assert_eq!(op["end_time"], 105);

        let back: Schedule = serde_json::from_value(value).unwrap();
        assert_eq!(back, s);
    }
}
