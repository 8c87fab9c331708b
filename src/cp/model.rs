//! CP model definition.
//!
//! The model is an arena: operation records are stored in a `Vec` in job
//! order, and each record owns its candidate slots (one per capable
//! machine). Everything is addressed by index, so iteration order is the
//! insertion order and no string keys are hashed.

use std::ops::Range;

use super::variables::{IntervalVar, PresenceLit};

/// Index of a candidate slot: `operations[op].candidates[slot]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotRef {
    /// Operation index in the arena.
    pub op: usize,
    /// Slot index within the operation's candidates.
    pub slot: usize,
}

impl SlotRef {
    pub fn new(op: usize, slot: usize) -> Self {
        Self { op, slot }
    }
}

/// One eligible machine for an operation, with its optional interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSlot {
    /// Machine index in `CpModel::machines`.
    pub machine: usize,
    /// Interval active when this slot is chosen.
    pub interval: IntervalVar,
}

/// An operation instance `(job, index)` and its candidate slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationNode {
    /// Job index in `CpModel::jobs`.
    pub job: usize,
    /// Position within the job.
    pub index: usize,
    /// Operation type tag.
    pub operation: String,
    /// Release offset of the owning job (clamped at 0).
    pub release: i64,
    /// Eligible machines, in machine order.
    pub candidates: Vec<CandidateSlot>,
}

impl OperationNode {
    /// Shortest duration over all candidate slots.
    pub fn min_duration(&self) -> i64 {
        self.candidates
            .iter()
            .map(|c| c.interval.duration)
            .min()
            .unwrap_or(0)
    }
}

/// A job's contiguous range of operation records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    /// Job identifier.
    pub id: String,
    /// Operation indices, in sequence order.
    pub operations: Range<usize>,
}

/// A constraint over candidate slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Exactly one candidate slot of the operation is present.
    ExactlyOne { op: usize },

    /// If both slots are present: `end(before) <= start(after)`.
    ConditionalPrecedence { before: SlotRef, after: SlotRef },

    /// Present intervals of these slots do not overlap.
    NoOverlap { machine: usize, slots: Vec<SlotRef> },

    /// If the slot is present: `start >= min_start`.
    ReleaseTime { slot: SlotRef, min_start: i64 },

    /// If the slot is present: `makespan >= end`.
    MakespanBound { slot: SlotRef },
}

/// A flexible job-shop constraint model.
///
/// # Examples
///
/// ```
/// use u_jobshop::cp::ScheduleCpBuilder;
/// use u_jobshop::config::OperationDurations;
/// use u_jobshop::models::{Job, Machine};
///
/// let jobs = vec![Job::new("J1").with_operations(["cutting", "welding"])];
/// let machines = vec![Machine::new("M1").with_capabilities(["cutting", "welding"])];
/// let model = ScheduleCpBuilder::new(&jobs, &machines, &OperationDurations::default())
///     .build(1440)
///     .unwrap();
/// assert_eq!(model.operation_count(), 2);
/// assert!(model.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpModel {
    /// Planning horizon (maximum time).
    pub horizon: i64,
    /// Jobs, in input order.
    pub jobs: Vec<JobRecord>,
    /// Machine identifiers, in input order.
    pub machines: Vec<String>,
    /// Operation arena, job-contiguous.
    pub operations: Vec<OperationNode>,
    /// Constraints.
    pub constraints: Vec<Constraint>,
    slot_count: usize,
}

impl CpModel {
    /// Creates an empty model.
    pub fn new(horizon: i64) -> Self {
        Self {
            horizon,
            jobs: Vec::new(),
            machines: Vec::new(),
            operations: Vec::new(),
            constraints: Vec::new(),
            slot_count: 0,
        }
    }

    /// Registers a machine and returns its index.
    pub fn add_machine(&mut self, id: impl Into<String>) -> usize {
        self.machines.push(id.into());
        self.machines.len() - 1
    }

    /// Registers a job with no operations yet and returns its index.
    pub fn add_job(&mut self, id: impl Into<String>) -> usize {
        let next = self.operations.len();
        self.jobs.push(JobRecord {
            id: id.into(),
            operations: next..next,
        });
        self.jobs.len() - 1
    }

    /// Appends an operation to `job` and returns its index.
    ///
    /// Operations must be added job by job so each job's range stays
    /// contiguous.
    pub fn add_operation(
        &mut self,
        job: usize,
        operation: impl Into<String>,
        release: i64,
    ) -> usize {
        let op = self.operations.len();
        let index = self.jobs[job].operations.len();
        self.operations.push(OperationNode {
            job,
            index,
            operation: operation.into(),
            release,
            candidates: Vec::new(),
        });
        self.jobs[job].operations.end = op + 1;
        op
    }

    /// Adds an optional interval for `op` on `machine`.
    pub fn add_candidate(&mut self, op: usize, machine: usize, duration: i64) -> SlotRef {
        let presence = PresenceLit(self.slot_count);
        self.slot_count += 1;

        let node = &mut self.operations[op];
        let interval = IntervalVar::optional(node.release, self.horizon, duration, presence);
        node.candidates.push(CandidateSlot { machine, interval });
        SlotRef::new(op, node.candidates.len() - 1)
    }

    /// Adds a constraint.
    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Looks up a candidate slot.
    pub fn slot(&self, slot: SlotRef) -> Option<&CandidateSlot> {
        self.operations.get(slot.op)?.candidates.get(slot.slot)
    }

    /// All slots of `op` as references.
    pub fn slots_of(&self, op: usize) -> impl Iterator<Item = SlotRef> + '_ {
        let count = self.operations.get(op).map_or(0, |o| o.candidates.len());
        (0..count).map(move |slot| SlotRef::new(op, slot))
    }

    /// All slots assignable to a machine, in operation order.
    pub fn slots_on_machine(&self, machine: usize) -> Vec<SlotRef> {
        self.operations
            .iter()
            .enumerate()
            .flat_map(|(op, node)| {
                node.candidates
                    .iter()
                    .enumerate()
                    .filter(move |(_, c)| c.machine == machine)
                    .map(move |(slot, _)| SlotRef::new(op, slot))
            })
            .collect()
    }

    /// Number of operation records.
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    /// Number of candidate slots (presence literals).
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Number of constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Validates that every constraint references existing slots and
    /// machines.
    pub fn validate(&self) -> Result<(), String> {
        let check_slot = |slot: &SlotRef| -> Result<(), String> {
            self.slot(*slot)
                .map(|_| ())
                .ok_or_else(|| format!("undefined slot: {slot:?}"))
        };

        for constraint in &self.constraints {
            match constraint {
                Constraint::ExactlyOne { op } => {
                    if *op >= self.operations.len() {
                        return Err(format!("undefined operation: {op}"));
                    }
                }
                Constraint::ConditionalPrecedence { before, after } => {
                    check_slot(before)?;
                    check_slot(after)?;
                }
                Constraint::NoOverlap { machine, slots } => {
                    if *machine >= self.machines.len() {
                        return Err(format!("undefined machine: {machine}"));
                    }
                    for slot in slots {
                        check_slot(slot)?;
                    }
                }
                Constraint::ReleaseTime { slot, .. } | Constraint::MakespanBound { slot } => {
                    check_slot(slot)?;
                }
            }
        }
        for node in &self.operations {
            if node.candidates.iter().any(|c| c.machine >= self.machines.len()) {
                return Err(format!("operation {} references undefined machine", node.operation));
            }
        }
        Ok(())
    }
}
