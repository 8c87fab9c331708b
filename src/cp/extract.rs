//! Solution to schedule conversion.

use crate::models::{Assignment, JobSchedule, Schedule};

use super::model::CpModel;
use super::solver::CpSolution;

/// Reads the present slot of every operation, in job order.
///
/// Returns `None` when the solution carries no schedule or does not cover
/// every operation of the model. The makespan is the maximum end time.
pub fn extract_schedule(model: &CpModel, solution: &CpSolution) -> Option<Schedule> {
    if !solution.is_solution_found() {
        return None;
    }

    let mut schedule = Schedule::new();
    for job in &model.jobs {
        let mut job_schedule = JobSchedule::new(job.id.clone());
        for op in job.operations.clone() {
            let placed = solution.assignments.get(op).copied().flatten()?;
            let node = &model.operations[op];
            let candidate = node.candidates.get(placed.slot)?;
            job_schedule = job_schedule.with_assignment(Assignment::new(
                node.operation.clone(),
                model.machines[candidate.machine].clone(),
                placed.start,
                placed.end,
            ));
        }
        schedule.add_job(job_schedule);
    }

    Some(schedule.with_computed_makespan())
}
