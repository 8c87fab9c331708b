//! Schedule validation.
//!
//! Re-checks a finished schedule independently of the solver that produced
//! it. Every problem found is collected as a [`ValidationIssue`]; nothing
//! panics and nothing is thrown.
//!
//! Structural checks always run:
//! - Intervals are well formed (`0 <= start <= end`)
//! - Operations of a job run in sequence
//! - No two operations overlap on a machine (closed-open intervals)
//! - `makespan` equals the latest end time
//!
//! Context-dependent checks run when the matching context is supplied:
//! - Jobs: unknown/missing jobs, operation list mismatches, release dates, due dates
//! - Machines: unknown machines, capability
//! - Machines + durations: processing time
//! - Horizon: no end time past it
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 2 (feasibility)

use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::Value;

use crate::config::OperationDurations;
use crate::models::{Assignment, Job, JobSchedule, Machine, Schedule};

/// A validation finding.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// Issue category.
    pub kind: IssueKind,
    /// Human-readable description.
    pub message: String,
}

impl ValidationIssue {
    fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Categories of validation findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    /// Input is not shaped like a schedule.
    MalformedSchedule,
    /// A scheduled job is not among the known jobs.
    UnknownJob,
    /// A job appears twice.
    DuplicateJob,
    /// A known job has no schedule.
    MissingJob,
    /// A job has a different number of assignments than operations.
    OperationCountMismatch,
    /// An assignment's operation differs from the job's operation at that index.
    OperationTypeMismatch,
    /// An assignment references an unknown machine.
    UnknownMachine,
    /// An assignment's machine lacks the operation's capability.
    IncompatibleMachine,
    /// Negative start or end before start.
    InvalidInterval,
    /// An assignment ends after the planning horizon.
    HorizonExceeded,
    /// Processing time differs from the machine-adjusted base duration.
    DurationMismatch,
    /// The duration table has no entry and no fallback for an operation type.
    UnknownOperationType,
    /// An operation starts before its predecessor in the job ends.
    SequenceViolation,
    /// An operation starts before its job's release date.
    ReleaseViolation,
    /// A job completes after its due date. Advisory only.
    DueDateMissed,
    /// Two operations overlap on one machine.
    MachineOverlap,
    /// `makespan` differs from the latest end time.
    MakespanMismatch,
}

impl IssueKind {
    /// Whether this finding makes the schedule invalid.
    pub fn is_violation(&self) -> bool {
        !matches!(self, IssueKind::DueDateMissed)
    }
}

/// Result of validating a schedule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// True when no finding is a violation.
    pub fn is_valid(&self) -> bool {
        self.issues.iter().all(|i| !i.kind.is_violation())
    }

    /// All findings, in detection order.
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Number of findings of one kind.
    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }

    /// `(valid, messages)`.
    pub fn into_parts(self) -> (bool, Vec<String>) {
        let valid = self.is_valid();
        (valid, self.issues.into_iter().map(|i| i.message).collect())
    }

    fn push(&mut self, kind: IssueKind, message: impl Into<String>) {
        self.issues.push(ValidationIssue::new(kind, message));
    }
}

/// Checks schedules against the invariants of a flexible job shop.
///
/// # Example
/// ```
/// use u_jobshop::models::{Assignment, JobSchedule, Schedule};
/// use u_jobshop::validation::ScheduleValidator;
///
/// let schedule = Schedule::new()
///     .with_job(JobSchedule::new("J1").with_assignment(Assignment::new("cutting", "M1", 0, 45)))
///     .with_job(JobSchedule::new("J2").with_assignment(Assignment::new("cutting", "M1", 30, 75)))
///     .with_computed_makespan();
///
/// let (valid, issues) = ScheduleValidator::new().validate(&schedule).into_parts();
/// assert!(!valid);
/// assert_eq!(issues.len(), 1);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleValidator<'a> {
    jobs: Option<&'a [Job]>,
    machines: Option<&'a [Machine]>,
    durations: Option<&'a OperationDurations>,
    horizon: Option<i64>,
}

impl<'a> ScheduleValidator<'a> {
    /// A validator with structural checks only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks against the job list.
    pub fn with_jobs(mut self, jobs: &'a [Job]) -> Self {
        self.jobs = Some(jobs);
        self
    }

    /// Checks against the machine list.
    pub fn with_machines(mut self, machines: &'a [Machine]) -> Self {
        self.machines = Some(machines);
        self
    }

    /// Checks processing times (needs machines too).
    pub fn with_durations(mut self, durations: &'a OperationDurations) -> Self {
        self.durations = Some(durations);
        self
    }

    /// Checks end times against a planning horizon.
    pub fn with_horizon(mut self, horizon: i64) -> Self {
        self.horizon = Some(horizon);
        self
    }

    /// Validates a typed schedule.
    pub fn validate(&self, schedule: &Schedule) -> ValidationReport {
        let mut report = ValidationReport::default();
        self.check(schedule, &HashSet::new(), &mut report);
        report
    }

    /// Validates a raw JSON schedule.
    ///
    /// Missing or malformed fields become issues; jobs that cannot be read
    /// are skipped and the rest are checked as in [`validate`](Self::validate).
    pub fn validate_value(&self, value: &Value) -> ValidationReport {
        let mut report = ValidationReport::default();

        let Some(raw_jobs) = value.get("jobs").and_then(Value::as_array) else {
            report.push(IssueKind::MalformedSchedule, "Invalid schedule format");
            return report;
        };

        let mut schedule = Schedule::new();
        let mut unreadable = HashSet::new();

        for raw in raw_jobs {
            let job_id = raw
                .get("job_id")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string();

            let Some(raw_ops) = raw.get("operations").and_then(Value::as_array) else {
                report.push(
                    IssueKind::MalformedSchedule,
                    format!("Missing operations for job {job_id}"),
                );
                unreadable.insert(job_id);
                continue;
            };

            let mut job_schedule = JobSchedule::new(job_id.clone());
            let mut readable = true;
            for (index, raw_op) in raw_ops.iter().enumerate() {
                match serde_json::from_value::<Assignment>(raw_op.clone()) {
                    Ok(assignment) => job_schedule.operations.push(assignment),
                    Err(e) => {
                        report.push(
                            IssueKind::MalformedSchedule,
                            format!("Malformed operation {index} of job {job_id}: {e}"),
                        );
                        readable = false;
                    }
                }
            }

            if readable {
                schedule.add_job(job_schedule);
            } else {
                unreadable.insert(job_id);
            }
        }

        match value.get("makespan").and_then(Value::as_i64) {
            Some(makespan) => schedule.makespan = makespan,
            None => {
                report.push(IssueKind::MalformedSchedule, "Missing or non-integer makespan");
                schedule.makespan = schedule.max_end_time();
            }
        }

        self.check(&schedule, &unreadable, &mut report);
        report
    }

    fn check(&self, schedule: &Schedule, skipped: &HashSet<String>, report: &mut ValidationReport) {
        let known_jobs: Option<HashMap<&str, &Job>> = self
            .jobs
            .map(|jobs| jobs.iter().map(|j| (j.id.as_str(), j)).collect());
        let known_machines: Option<HashMap<&str, &Machine>> = self
            .machines
            .map(|machines| machines.iter().map(|m| (m.id.as_str(), m)).collect());

        let mut seen = HashSet::new();
        for job_schedule in &schedule.jobs {
            let job_id = job_schedule.job_id.as_str();
            if !seen.insert(job_id) {
                report.push(IssueKind::DuplicateJob, format!("Duplicate schedule for job {job_id}"));
            }

            let job = match &known_jobs {
                Some(known) => match known.get(job_id) {
                    Some(job) => Some(*job),
                    None => {
                        report.push(IssueKind::UnknownJob, format!("Unknown job {job_id}"));
                        None
                    }
                },
                None => None,
            };
            if let Some(job) = job {
                self.check_job_operations(job, job_schedule, report);
            }

            for assignment in &job_schedule.operations {
                self.check_assignment(job_id, assignment, known_machines.as_ref(), report);
            }

            for pair in job_schedule.operations.windows(2) {
                let (current, next) = (&pair[0], &pair[1]);
                if current.end_time > next.start_time {
                    report.push(
                        IssueKind::SequenceViolation,
                        format!(
                            "Invalid sequence in job {job_id}: {} ends after {} starts",
                            current.operation, next.operation
                        ),
                    );
                }
            }

            if let Some(job) = job {
                check_job_dates(job, job_schedule, report);
            }
        }

        if let Some(jobs) = self.jobs {
            for job in jobs {
                if !seen.contains(job.id.as_str()) && !skipped.contains(&job.id) {
                    report.push(IssueKind::MissingJob, format!("No schedule for job {}", job.id));
                }
            }
        }

        check_machine_overlaps(schedule, report);

        let max_end = schedule.max_end_time();
        if schedule.makespan != max_end {
            report.push(
                IssueKind::MakespanMismatch,
                format!(
                    "Makespan {} differs from latest end time {max_end}",
                    schedule.makespan
                ),
            );
        }
    }

    fn check_job_operations(&self, job: &Job, job_schedule: &JobSchedule, report: &mut ValidationReport) {
        if job.operations.len() != job_schedule.operations.len() {
            report.push(
                IssueKind::OperationCountMismatch,
                format!(
                    "Job {} has {} operations but {} assignments",
                    job.id,
                    job.operations.len(),
                    job_schedule.operations.len()
                ),
            );
        }
        for (index, (expected, assignment)) in
            job.operations.iter().zip(&job_schedule.operations).enumerate()
        {
            if *expected != assignment.operation {
                report.push(
                    IssueKind::OperationTypeMismatch,
                    format!(
                        "Job {} operation {index} is {expected} but {} was scheduled",
                        job.id, assignment.operation
                    ),
                );
            }
        }
    }

    fn check_assignment(
        &self,
        job_id: &str,
        assignment: &Assignment,
        known_machines: Option<&HashMap<&str, &Machine>>,
        report: &mut ValidationReport,
    ) {
        let Assignment {
            operation,
            machine: machine_id,
            start_time,
            end_time,
        } = assignment;

        if *start_time < 0 || end_time < start_time {
            report.push(
                IssueKind::InvalidInterval,
                format!("Invalid interval [{start_time}, {end_time}) for {operation} of job {job_id}"),
            );
        }

        if let Some(horizon) = self.horizon {
            if *end_time > horizon {
                report.push(
                    IssueKind::HorizonExceeded,
                    format!("{operation} of job {job_id} ends at {end_time}, past horizon {horizon}"),
                );
            }
        }

        let Some(known) = known_machines else {
            return;
        };
        let Some(machine) = known.get(machine_id.as_str()) else {
            report.push(
                IssueKind::UnknownMachine,
                format!("{operation} of job {job_id} assigned to unknown machine {machine_id}"),
            );
            return;
        };

        if !machine.can_perform(operation) {
            report.push(
                IssueKind::IncompatibleMachine,
                format!("Machine {machine_id} cannot perform {operation} of job {job_id}"),
            );
        }

        let Some(durations) = self.durations else {
            return;
        };
        let Some(base) = durations.base_minutes(operation) else {
            report.push(
                IssueKind::UnknownOperationType,
                format!("No base duration for {operation} of job {job_id}"),
            );
            return;
        };
        let expected = machine.processing_minutes(base);
        if assignment.duration() != expected {
            report.push(
                IssueKind::DurationMismatch,
                format!(
                    "{operation} of job {job_id} on {machine_id} lasts {} minutes, expected {expected}",
                    assignment.duration()
                ),
            );
        }
    }
}

fn check_job_dates(job: &Job, job_schedule: &JobSchedule, report: &mut ValidationReport) {
    for assignment in &job_schedule.operations {
        if assignment.start_time < job.release_date {
            report.push(
                IssueKind::ReleaseViolation,
                format!(
                    "{} of job {} starts at {}, before release {}",
                    assignment.operation, job.id, assignment.start_time, job.release_date
                ),
            );
        }
    }

    if let (Some(due), Some(completion)) = (job.due_date, job_schedule.completion_time()) {
        if completion > due {
            report.push(
                IssueKind::DueDateMissed,
                format!("Job {} completes at {completion}, after due date {due}", job.id),
            );
        }
    }
}

/// Reports every overlapping pair per machine, machines in id order.
fn check_machine_overlaps(schedule: &Schedule, report: &mut ValidationReport) {
    let mut by_machine: BTreeMap<&str, Vec<(&str, &Assignment)>> = BTreeMap::new();
    for (job_id, assignment) in schedule.assignments() {
        by_machine
            .entry(assignment.machine.as_str())
            .or_default()
            .push((job_id, assignment));
    }

    for (machine, mut entries) in by_machine {
        entries.sort_by_key(|(_, a)| (a.start_time, a.end_time));
        for (i, (job_a, a)) in entries.iter().enumerate() {
            for (job_b, b) in &entries[i + 1..] {
                if b.start_time >= a.end_time {
                    break;
                }
                if a.window().overlaps(&b.window()) {
                    report.push(
                        IssueKind::MachineOverlap,
                        format!(
                            "Machine conflict on {machine}: {job_a}/{} [{}, {}) overlaps {job_b}/{} [{}, {})",
                            a.operation, a.start_time, a.end_time, b.operation, b.start_time, b.end_time
                        ),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job(id: &str, ops: &[(&str, &str, i64, i64)]) -> JobSchedule {
        ops.iter().fold(JobSchedule::new(id), |js, (op, m, s, e)| {
            js.with_assignment(Assignment::new(*op, *m, *s, *e))
        })
    }

    fn shop() -> (Vec<Job>, Vec<Machine>) {
        let jobs = vec![
            Job::new("J1").with_operations(["cutting", "welding"]),
            Job::new("J2").with_operation("cutting"),
        ];
        let machines = vec![
            Machine::new("M1").with_capability("cutting"),
            Machine::new("M2").with_capability("welding"),
        ];
        (jobs, machines)
    }

    #[test]
    fn test_valid_schedule() {
        let (jobs, machines) = shop();
        let durations = OperationDurations::default();
        let schedule = Schedule::new()
            .with_job(job("J1", &[("cutting", "M1", 0, 45), ("welding", "M2", 45, 105)]))
            .with_job(job("J2", &[("cutting", "M1", 45, 90)]))
            .with_computed_makespan();

        let report = ScheduleValidator::new()
            .with_jobs(&jobs)
            .with_machines(&machines)
            .with_durations(&durations)
            .with_horizon(1440)
            .validate(&schedule);
        assert_eq!(report.into_parts(), (true, vec![]));
    }

    #[test]
    fn test_overlap_reports_one_conflict() {
        let schedule = Schedule::new()
            .with_job(job("J1", &[("cutting", "M1", 0, 45)]))
            .with_job(job("J2", &[("cutting", "M1", 30, 75)]))
            .with_computed_makespan();

        let (valid, issues) = ScheduleValidator::new().validate(&schedule).into_parts();
        assert!(!valid);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("M1"));
        assert!(issues[0].starts_with("Machine conflict"));
    }

    #[test]
    fn test_touching_and_zero_length_intervals() {
        let schedule = Schedule::new()
            .with_job(job("J1", &[("cutting", "M1", 0, 45), ("testing", "M1", 45, 45)]))
            .with_job(job("J2", &[("cutting", "M1", 45, 90)]))
            .with_job(job("J3", &[("testing", "M1", 60, 60)]))
            .with_computed_makespan();

        let report = ScheduleValidator::new().validate(&schedule);
        assert!(report.is_valid(), "{:?}", report.issues());
    }

    #[test]
    fn test_sequence_violation_message() {
        let schedule = Schedule::new()
            .with_job(job("J1", &[("cutting", "M1", 0, 45), ("welding", "M2", 40, 100)]))
            .with_computed_makespan();

        let (valid, issues) = ScheduleValidator::new().validate(&schedule).into_parts();
        assert!(!valid);
        assert_eq!(
            issues,
            vec!["Invalid sequence in job J1: cutting ends after welding starts".to_string()]
        );
    }

    #[test]
    fn test_context_checks() {
        let (jobs, machines) = shop();
        let durations = OperationDurations::default();
        let schedule = Schedule::new()
            .with_job(job("J1", &[("cutting", "M2", 0, 40)]))
            .with_job(job("J9", &[("cutting", "M7", 0, 45)]))
            .with_computed_makespan();

        let report = ScheduleValidator::new()
            .with_jobs(&jobs)
            .with_machines(&machines)
            .with_durations(&durations)
            .validate(&schedule);

        assert!(!report.is_valid());
        assert_eq!(report.count(IssueKind::OperationCountMismatch), 1);
        assert_eq!(report.count(IssueKind::IncompatibleMachine), 1);
        assert_eq!(report.count(IssueKind::DurationMismatch), 1);
        assert_eq!(report.count(IssueKind::UnknownJob), 1);
        assert_eq!(report.count(IssueKind::UnknownMachine), 1);
        assert_eq!(report.count(IssueKind::MissingJob), 1);
    }

    #[test]
    fn test_operation_without_duration() {
        let jobs = vec![Job::new("J1").with_operations(["cutting", "deburring"])];
        let machines = vec![Machine::new("M1").with_capabilities(["cutting", "deburring"])];
        let durations = OperationDurations::empty().with_duration("cutting", 45);
        let schedule = Schedule::new()
            .with_job(job("J1", &[("cutting", "M1", 0, 45), ("deburring", "M1", 45, 60)]))
            .with_computed_makespan();

        let report = ScheduleValidator::new()
            .with_jobs(&jobs)
            .with_machines(&machines)
            .with_durations(&durations)
            .validate(&schedule);
        assert!(!report.is_valid());
        assert_eq!(report.count(IssueKind::UnknownOperationType), 1);
        assert_eq!(report.issues().len(), 1);
    }

    #[test]
    fn test_release_due_and_horizon() {
        let jobs = vec![Job::new("J1")
            .with_operation("cutting")
            .with_release_date(10)
            .with_due_date(30)];
        let schedule = Schedule::new()
            .with_job(job("J1", &[("cutting", "M1", 0, 45)]))
            .with_computed_makespan();

        let report = ScheduleValidator::new()
            .with_jobs(&jobs)
            .with_horizon(40)
            .validate(&schedule);
        assert_eq!(report.count(IssueKind::ReleaseViolation), 1);
        assert_eq!(report.count(IssueKind::DueDateMissed), 1);
        assert_eq!(report.count(IssueKind::HorizonExceeded), 1);
    }

    #[test]
    fn test_due_date_alone_is_advisory() {
        let jobs = vec![Job::new("J1").with_operation("cutting").with_due_date(30)];
        let schedule = Schedule::new()
            .with_job(job("J1", &[("cutting", "M1", 0, 45)]))
            .with_computed_makespan();

        let (valid, issues) = ScheduleValidator::new().with_jobs(&jobs).validate(&schedule).into_parts();
        assert!(valid);
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_makespan_and_interval() {
        let mut schedule = Schedule::new().with_job(job("J1", &[("cutting", "M1", 50, 45)]));
        schedule.makespan = 99;

        let report = ScheduleValidator::new().validate(&schedule);
        assert_eq!(report.count(IssueKind::InvalidInterval), 1);
        assert_eq!(report.count(IssueKind::MakespanMismatch), 1);
    }

    #[test]
    fn test_duplicate_job() {
        let schedule = Schedule::new()
            .with_job(job("J1", &[("cutting", "M1", 0, 45)]))
            .with_job(job("J1", &[("cutting", "M2", 0, 45)]))
            .with_computed_makespan();
        let report = ScheduleValidator::new().validate(&schedule);
        assert_eq!(report.count(IssueKind::DuplicateJob), 1);
    }

    #[test]
    fn test_value_invalid_format() {
        let (valid, issues) = ScheduleValidator::new()
            .validate_value(&json!({ "makespan": 10 }))
            .into_parts();
        assert!(!valid);
        assert_eq!(issues, vec!["Invalid schedule format".to_string()]);

        let report = ScheduleValidator::new().validate_value(&json!(null));
        assert_eq!(report.count(IssueKind::MalformedSchedule), 1);
    }

    #[test]
    fn test_value_missing_operations() {
        let (jobs, _) = shop();
        let value = json!({
            "makespan": 45,
            "jobs": [
                { "job_id": "J1" },
                { "job_id": "J2", "operations": [
                    { "operation": "cutting", "machine": "M1", "start_time": 0, "end_time": 45 }
                ] }
            ]
        });

        let (valid, issues) = ScheduleValidator::new().with_jobs(&jobs).validate_value(&value).into_parts();
        assert!(!valid);
        assert_eq!(issues, vec!["Missing operations for job J1".to_string()]);
    }

    #[test]
    fn test_value_round_trip() {
        let schedule = Schedule::new()
            .with_job(job("J1", &[("cutting", "M1", 0, 45), ("welding", "M2", 45, 105)]))
            .with_computed_makespan();
        let value = serde_json::to_value(&schedule).unwrap();

        assert!(ScheduleValidator::new().validate_value(&value).is_valid());
    }

    #[test]
    fn test_value_malformed_operation() {
        let value = json!({
            "makespan": 45,
            "jobs": [ { "job_id": "J1", "operations": [ { "operation": "cutting", "start_time": 0 } ] } ]
        });
        let report = ScheduleValidator::new().validate_value(&value);
        assert_eq!(report.count(IssueKind::MalformedSchedule), 1);
        // the unreadable job is skipped, so makespan 45 has nothing to match
        assert_eq!(report.count(IssueKind::MakespanMismatch), 1);
    }
}
