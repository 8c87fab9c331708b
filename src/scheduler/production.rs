//! Production scheduling facade.
//!
//! Owns the job and machine lists for one planning run and wires the
//! builder, solver, extractor, validator, and statistics together.

use std::time::Duration;

use tracing::Span;

use crate::config::SchedulerConfig;
use crate::cp::{extract_schedule, BranchAndBoundSolver, CpSolver, ScheduleCpBuilder, SolverConfig, SolverStatus};
use crate::error::{Result, ScheduleError};
use crate::models::{Job, Machine, Schedule};
use crate::validation::{ScheduleValidator, ValidationReport};

use super::ScheduleStatistics;

/// Result of one optimize call.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    /// Final solver status.
    pub status: SolverStatus,
    /// The schedule, present for `Optimal` and `Feasible`.
    pub schedule: Option<Schedule>,
    /// Search nodes visited.
    pub nodes_explored: u64,
    /// Wall-clock time spent in the solver.
    pub elapsed: Duration,
}

impl SolveOutcome {
    /// Whether a schedule was found.
    pub fn is_solution_found(&self) -> bool {
        self.schedule.is_some()
    }

    /// The schedule, or an error describing why there is none.
    ///
    /// # Errors
    /// - `Infeasible` status: [`ScheduleError::Infeasible`]
    /// - `Unknown` status: [`ScheduleError::BudgetExhausted`]
    pub fn into_schedule(self) -> Result<Schedule> {
        match (self.status, self.schedule) {
            (SolverStatus::Optimal | SolverStatus::Feasible, Some(schedule)) => Ok(schedule),
            (SolverStatus::Unknown, _) => Err(ScheduleError::BudgetExhausted {
                nodes: self.nodes_explored,
            }),
            (status, _) => Err(ScheduleError::Infeasible(format!(
                "no schedule satisfies all constraints within the horizon (status {status:?})"
            ))),
        }
    }
}

/// Flexible job-shop scheduler.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use u_jobshop::config::SchedulerConfig;
/// use u_jobshop::cp::SolverStatus;
/// use u_jobshop::models::{Job, Machine};
/// use u_jobshop::scheduler::ProductionScheduler;
///
/// let mut scheduler = ProductionScheduler::new(SchedulerConfig::default());
/// scheduler.add_machine(Machine::new("M1").with_capabilities(["cutting", "welding"]));
/// scheduler.add_job(Job::new("J1").with_operations(["cutting", "welding"]));
///
/// let outcome = scheduler.optimize(1440, Duration::from_secs(5)).unwrap();
/// assert_eq!(outcome.status, SolverStatus::Optimal);
///
/// let schedule = outcome.into_schedule().unwrap();
/// assert_eq!(schedule.makespan, 105);
/// assert!(scheduler.validate(&schedule).is_valid());
/// ```
#[derive(Debug, Clone)]
pub struct ProductionScheduler {
    config: SchedulerConfig,
    jobs: Vec<Job>,
    machines: Vec<Machine>,
    span: Span,
}

impl ProductionScheduler {
    /// Creates a scheduler with no jobs or machines.
    ///
    /// Without a span from [`with_span`](Self::with_span), events are
    /// emitted as root events to whatever subscriber is installed.
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            jobs: Vec::new(),
            machines: Vec::new(),
            span: Span::none(),
        }
    }

    /// Emits all events as children of `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Registers a job.
    pub fn add_job(&mut self, job: Job) {
        tracing::info!(
            parent: &self.span,
            job_id = %job.id,
            operations = job.operation_count(),
            "Job added"
        );
        self.jobs.push(job);
    }

    /// Registers a machine.
    pub fn add_machine(&mut self, machine: Machine) {
        tracing::info!(
            parent: &self.span,
            machine_id = %machine.id,
            capabilities = ?machine.capabilities,
            efficiency = machine.efficiency_factor,
            "Machine added"
        );
        self.machines.push(machine);
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    /// Builds the model and searches for a minimum-makespan schedule.
    ///
    /// A schedule that is not proven optimal is still returned when the
    /// budget runs out after one was found (`Feasible`).
    ///
    /// # Errors
    /// [`ScheduleError::Configuration`] when the instance cannot be
    /// modeled. Solver outcomes without a schedule are not errors here;
    /// see [`SolveOutcome::into_schedule`].
    pub fn optimize(&self, horizon_minutes: i64, time_budget: Duration) -> Result<SolveOutcome> {
        tracing::info!(
            parent: &self.span,
            jobs = self.jobs.len(),
            machines = self.machines.len(),
            horizon_minutes,
            budget_ms = time_budget.as_millis() as u64,
            "Starting optimization"
        );

        let model = ScheduleCpBuilder::new(&self.jobs, &self.machines, &self.config.operation_durations)
            .build(horizon_minutes)
            .map_err(|e| {
                tracing::error!(parent: &self.span, error = %e, "Model construction failed");
                e
            })?;

        let solver_config = SolverConfig::default()
            .with_time_limit(time_budget)
            .with_node_limit(self.config.node_limit);
        let solution = BranchAndBoundSolver::new()
            .with_span(self.span.clone())
            .solve(&model, &solver_config);
        let schedule = extract_schedule(&model, &solution);

        match &schedule {
            Some(schedule) => tracing::info!(
                parent: &self.span,
                status = ?solution.status,
                makespan = schedule.makespan,
                nodes = solution.nodes_explored,
                "Solution found"
            ),
            None => tracing::error!(
                parent: &self.span,
                status = ?solution.status,
                nodes = solution.nodes_explored,
                "No solution found"
            ),
        }

        Ok(SolveOutcome {
            status: solution.status,
            schedule,
            nodes_explored: solution.nodes_explored,
            elapsed: solution.solve_time,
        })
    }

    /// [`optimize`](Self::optimize) with the configured horizon and budget.
    pub fn optimize_default(&self) -> Result<SolveOutcome> {
        self.optimize(self.config.horizon_minutes, self.config.time_budget())
    }

    /// Validates a schedule against the registered jobs, machines, duration
    /// table, and the configured horizon.
    pub fn validate(&self, schedule: &Schedule) -> ValidationReport {
        self.validate_within(schedule, self.config.horizon_minutes)
    }

    /// Like [`validate`](Self::validate), against an explicit horizon such
    /// as the one passed to [`optimize`](Self::optimize).
    pub fn validate_within(&self, schedule: &Schedule, horizon_minutes: i64) -> ValidationReport {
        ScheduleValidator::new()
            .with_jobs(&self.jobs)
            .with_machines(&self.machines)
            .with_durations(&self.config.operation_durations)
            .with_horizon(horizon_minutes)
            .validate(schedule)
    }

    /// Computes statistics over the registered machines.
    pub fn statistics(&self, schedule: &Schedule) -> ScheduleStatistics {
        ScheduleStatistics::calculate(schedule, &self.machines)
    }
}

impl Default for ProductionScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}
