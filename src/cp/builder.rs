//! Constraint model builder.
//!
//! Compiles jobs and machines into a [`CpModel`]: one operation record per
//! operation instance, one optional interval per capable machine, and the
//! assignment, precedence, no-overlap, release, and makespan constraints.
//!
//! # Reference
//! - Laborie et al. (2018), "IBM ILOG CP Optimizer for Scheduling"
//! - Brandimarte (1993), "Routing and scheduling in a flexible job shop by tabu search"

use std::collections::HashSet;

use crate::config::OperationDurations;
use crate::error::ConfigurationError;
use crate::models::{Job, Machine, Schedule};

use super::extract::extract_schedule;
use super::model::{Constraint, CpModel, SlotRef};
use super::solver::{CpSolution, CpSolver, SolverConfig};

/// Builds a CP model from scheduling domain objects.
///
/// The builder holds read-only views of the caller's jobs and machines;
/// nothing is copied until [`build`](Self::build) runs.
pub struct ScheduleCpBuilder<'a> {
    jobs: &'a [Job],
    machines: &'a [Machine],
    durations: &'a OperationDurations,
}

impl<'a> ScheduleCpBuilder<'a> {
    /// Creates a new CP builder.
    pub fn new(
        jobs: &'a [Job],
        machines: &'a [Machine],
        durations: &'a OperationDurations,
    ) -> Self {
        Self {
            jobs,
            machines,
            durations,
        }
    }

    /// Builds a CP model with the given planning horizon.
    ///
    /// Creates:
    /// - A candidate slot (presence + optional interval) per capable machine
    /// - `ExactlyOne` per operation
    /// - `ReleaseTime` per slot
    /// - `ConditionalPrecedence` per consecutive operation pair and machine pair
    /// - `MakespanBound` per slot of each job's last operation
    /// - `NoOverlap` per machine with two or more slots
    ///
    /// # Errors
    /// Fails on the first instance defect found; no partial model is
    /// returned. An operation without a capable machine is
    /// [`ConfigurationError::NoCompatibleMachine`].
    pub fn build(&self, horizon: i64) -> Result<CpModel, ConfigurationError> {
        if horizon <= 0 {
            return Err(ConfigurationError::InvalidHorizon(horizon));
        }
        self.check_machines()?;
        self.check_jobs()?;

        let mut model = CpModel::new(horizon);
        for machine in self.machines {
            model.add_machine(&machine.id);
        }

        for job in self.jobs {
            let job_idx = model.add_job(&job.id);
            let release = job.release_date.max(0);
            let mut previous: Option<usize> = None;

            for instance in job.operation_instances() {
                let base = self.base_duration(instance.operation_type)?;
                let op = model.add_operation(job_idx, instance.operation_type, release);

                for (m_idx, machine) in self.machines.iter().enumerate() {
                    if machine.can_perform(instance.operation_type) {
                        model.add_candidate(op, m_idx, machine.processing_minutes(base));
                    }
                }
                if model.operations[op].candidates.is_empty() {
                    return Err(ConfigurationError::NoCompatibleMachine {
                        job_id: job.id.clone(),
                        operation_index: instance.operation_index,
                        operation: instance.operation_type.to_string(),
                    });
                }

                model.add_constraint(Constraint::ExactlyOne { op });
                let slots: Vec<SlotRef> = model.slots_of(op).collect();
                for &slot in &slots {
                    model.add_constraint(Constraint::ReleaseTime {
                        slot,
                        min_start: release,
                    });
                }

                // Intra-job precedence over every machine combination
                if let Some(prev) = previous {
                    let prev_slots: Vec<SlotRef> = model.slots_of(prev).collect();
                    for &before in &prev_slots {
                        for &after in &slots {
                            model.add_constraint(Constraint::ConditionalPrecedence {
                                before,
                                after,
                            });
                        }
                    }
                }
                previous = Some(op);
            }

            if let Some(last) = previous {
                let slots: Vec<SlotRef> = model.slots_of(last).collect();
                for slot in slots {
                    model.add_constraint(Constraint::MakespanBound { slot });
                }
            }
        }

        for machine in 0..model.machines.len() {
            let slots = model.slots_on_machine(machine);
            if slots.len() > 1 {
                model.add_constraint(Constraint::NoOverlap { machine, slots });
            }
        }

        Ok(model)
    }

    /// Builds the model, solves it, and extracts the schedule.
    ///
    /// The schedule is `None` unless the solver reports `Optimal` or
    /// `Feasible`.
    pub fn solve<S: CpSolver>(
        &self,
        solver: &S,
        config: &SolverConfig,
        horizon: i64,
    ) -> Result<(Option<Schedule>, CpSolution), ConfigurationError> {
        let model = self.build(horizon)?;
        let solution = solver.solve(&model, config);
        let schedule = extract_schedule(&model, &solution);
        Ok((schedule, solution))
    }

    fn base_duration(&self, operation: &str) -> Result<i64, ConfigurationError> {
        let minutes = self
            .durations
            .base_minutes(operation)
            .ok_or_else(|| ConfigurationError::UnknownOperationType(operation.to_string()))?;
        if minutes < 0 {
            return Err(ConfigurationError::NegativeDuration {
                operation: operation.to_string(),
                minutes,
            });
        }
        Ok(minutes)
    }

    fn check_machines(&self) -> Result<(), ConfigurationError> {
        let mut seen = HashSet::new();
        for machine in self.machines {
            if !seen.insert(machine.id.as_str()) {
                return Err(ConfigurationError::DuplicateMachine(machine.id.clone()));
            }
            if !machine.has_valid_efficiency() {
                return Err(ConfigurationError::InvalidEfficiency {
                    machine_id: machine.id.clone(),
                    factor: machine.efficiency_factor,
                });
            }
        }
        Ok(())
    }

    fn check_jobs(&self) -> Result<(), ConfigurationError> {
        let mut seen = HashSet::new();
        for job in self.jobs {
            if !seen.insert(job.id.as_str()) {
                return Err(ConfigurationError::DuplicateJob(job.id.clone()));
            }
            if !job.has_operations() {
                return Err(ConfigurationError::EmptyJob(job.id.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shop() -> (Vec<Job>, Vec<Machine>) {
        let jobs = vec![
            Job::new("J1").with_operations(["cutting", "welding", "assembly"]),
            Job::new("J2").with_operations(["cutting", "assembly"]),
        ];
        let machines = vec![
            Machine::new("M1").with_capabilities(["cutting", "welding"]),
            Machine::new("M2").with_capabilities(["welding", "assembly"]),
        ];
        (jobs, machines)
    }

    #[test]
    fn test_build_model() {
        let (jobs, machines) = shop();
        let durations = OperationDurations::default();
        let model = ScheduleCpBuilder::new(&jobs, &machines, &durations)
            .build(1440)
            .unwrap();

        assert_eq!(model.operation_count(), 5);
        // cutting: M1; welding: M1, M2; assembly: M2
        assert_eq!(model.slot_count(), 6);
        assert_eq!(model.jobs[1].operations, 3..5);

        let welding = &model.operations[1];
        assert_eq!(welding.candidates.len(), 2);
        assert_eq!(welding.candidates[1].machine, 1);
        assert_eq!(welding.candidates[1].interval.duration, 60);
        assert_eq!(welding.candidates[1].interval.start.max, 1440 - 60);
    }

    #[test]
    fn test_constraint_counts() {
        let (jobs, machines) = shop();
        let durations = OperationDurations::default();
        let model = ScheduleCpBuilder::new(&jobs, &machines, &durations)
            .build(1440)
            .unwrap();

        let count = |pred: fn(&Constraint) -> bool| model.constraints.iter().filter(|c| pred(c)).count();

        assert_eq!(count(|c| matches!(c, Constraint::ExactlyOne { .. })), 5);
        assert_eq!(count(|c| matches!(c, Constraint::ReleaseTime { .. })), 6);
        // J1: cut->weld 1x2, weld->asm 2x1; J2: cut->asm 1x1
        assert_eq!(count(|c| matches!(c, Constraint::ConditionalPrecedence { .. })), 5);
        // J1 assembly (1 slot) + J2 assembly (1 slot)
        assert_eq!(count(|c| matches!(c, Constraint::MakespanBound { .. })), 2);
        assert_eq!(count(|c| matches!(c, Constraint::NoOverlap { .. })), 2);
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_missing_capability_fails_fast() {
        let jobs = vec![Job::new("J1").with_operations(["cutting", "painting"])];
        let machines = vec![Machine::new("M1").with_capability("cutting")];
        let durations = OperationDurations::default();

        let err = ScheduleCpBuilder::new(&jobs, &machines, &durations)
            .build(1440)
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::NoCompatibleMachine {
                job_id: "J1".into(),
                operation_index: 1,
                operation: "painting".into(),
            }
        );
    }

    #[test]
    fn test_efficiency_scales_duration() {
        let jobs = vec![Job::new("J1").with_operation("assembly")];
        let machines = vec![
            Machine::new("slow").with_capability("assembly").with_efficiency(0.8),
            Machine::new("fast").with_capability("assembly").with_efficiency(1.5),
        ];
        let durations = OperationDurations::default();
        let model = ScheduleCpBuilder::new(&jobs, &machines, &durations)
            .build(1440)
            .unwrap();

        let lengths: Vec<i64> = model.operations[0]
            .candidates
            .iter()
            .map(|c| c.interval.duration)
            .collect();
        assert_eq!(lengths, vec![112, 60]);
    }

    #[test]
    fn test_release_bounds_start() {
        let jobs = vec![Job::new("J1").with_operation("cutting").with_release_date(120)];
        let machines = vec![Machine::new("M1").with_capability("cutting")];
        let durations = OperationDurations::default();
        let model = ScheduleCpBuilder::new(&jobs, &machines, &durations)
            .build(1440)
            .unwrap();

        let slot = &model.operations[0].candidates[0];
        assert_eq!(slot.interval.start.min, 120);
        assert!(model.constraints.contains(&Constraint::ReleaseTime {
            slot: SlotRef::new(0, 0),
            min_start: 120,
        }));
    }

    #[test]
    fn test_instance_defects() {
        let durations = OperationDurations::default();
        let machines = vec![Machine::new("M1").with_capability("cutting")];

        let dup = vec![
            Job::new("J1").with_operation("cutting"),
            Job::new("J1").with_operation("cutting"),
        ];
        assert_eq!(
            ScheduleCpBuilder::new(&dup, &machines, &durations).build(100),
            Err(ConfigurationError::DuplicateJob("J1".into()))
        );

        let empty = vec![Job::new("J0")];
        assert_eq!(
            ScheduleCpBuilder::new(&empty, &machines, &durations).build(100),
            Err(ConfigurationError::EmptyJob("J0".into()))
        );

        let ok = vec![Job::new("J1").with_operation("cutting")];
        assert_eq!(
            ScheduleCpBuilder::new(&ok, &machines, &durations).build(0),
            Err(ConfigurationError::InvalidHorizon(0))
        );

        let broken = vec![Machine::new("M1").with_capability("cutting").with_efficiency(0.0)];
        assert!(matches!(
            ScheduleCpBuilder::new(&ok, &broken, &durations).build(100),
            Err(ConfigurationError::InvalidEfficiency { .. })
        ));

        let twins = vec![
            Machine::new("M1").with_capability("cutting"),
            Machine::new("M1").with_capability("cutting"),
        ];
        assert_eq!(
            ScheduleCpBuilder::new(&ok, &twins, &durations).build(100),
            Err(ConfigurationError::DuplicateMachine("M1".into()))
        );
    }

    #[test]
    fn test_solve_round_trip() {
        let (jobs, machines) = shop();
        let durations = OperationDurations::default();
        let (schedule, solution) = ScheduleCpBuilder::new(&jobs, &machines, &durations)
            .solve(&crate::cp::BranchAndBoundSolver::new(), &SolverConfig::default(), 1440)
            .unwrap();

        let schedule = schedule.unwrap();
        assert_eq!(Some(schedule.makespan), solution.objective_value);
        assert_eq!(schedule.assignment_count(), 5);
    }

    #[test]
    fn test_extreme_release_and_duration_are_infeasible() {
        let machines = vec![Machine::new("M1").with_capabilities(["cutting", "forging"])];
        let durations = OperationDurations::default().with_duration("forging", i64::MAX);
        let solver = crate::cp::BranchAndBoundSolver::new();

        let late = vec![Job::new("J1")
            .with_operations(["cutting", "cutting"])
            .with_release_date(i64::MAX - 10)];
        let (schedule, solution) = ScheduleCpBuilder::new(&late, &machines, &durations)
            .solve(&solver, &SolverConfig::default(), 1440)
            .unwrap();
        assert!(schedule.is_none());
        assert_eq!(solution.status, crate::cp::SolverStatus::Infeasible);

        let long = vec![Job::new("J1").with_operations(["forging", "cutting"])];
        let (schedule, solution) = ScheduleCpBuilder::new(&long, &machines, &durations)
            .solve(&solver, &SolverConfig::default(), 1440)
            .unwrap();
        assert!(schedule.is_none());
        assert_eq!(solution.status, crate::cp::SolverStatus::Infeasible);
    }

    #[test]
    fn test_unknown_type_without_fallback() {
        let jobs = vec![Job::new("J1").with_operation("polishing")];
        let machines = vec![Machine::new("M1").with_capability("polishing")];
        let strict = OperationDurations::empty().with_duration("cutting", 45);

        assert_eq!(
            ScheduleCpBuilder::new(&jobs, &machines, &strict).build(100),
            Err(ConfigurationError::UnknownOperationType("polishing".into()))
        );

        let lenient = OperationDurations::default();
        let model = ScheduleCpBuilder::new(&jobs, &machines, &lenient)
            .build(100)
            .unwrap();
        assert_eq!(model.operations[0].candidates[0].interval.duration, 60);
    }
}
