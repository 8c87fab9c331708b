//! Schedule statistics.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Makespan (C_max) | The schedule's makespan |
//! | Machine utilization | busy time / makespan × 100, per machine |
//! | Machine load | Number of operations per machine |
//! | Job duration | Last end - first start, per job |
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{Machine, Schedule};

/// Summary statistics of a schedule.
///
/// Maps are keyed by id and iterate in id order, so the serialized form
/// is stable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleStatistics {
    /// Makespan (minutes).
    pub makespan: i64,
    /// Number of scheduled jobs.
    pub total_jobs: usize,
    /// Busy percentage of the makespan, per machine (0.0..=100.0).
    pub machine_utilization: BTreeMap<String, f64>,
    /// Span from first start to last end, per job with assignments.
    pub job_durations: BTreeMap<String, i64>,
    /// Operation count, per machine.
    pub machine_load: BTreeMap<String, usize>,
}

impl ScheduleStatistics {
    /// Computes statistics for `schedule` over the given machines.
    ///
    /// Every listed machine gets an entry, idle ones included.
    /// Utilization is 0 for every machine when the makespan is not positive.
    pub fn calculate(schedule: &Schedule, machines: &[Machine]) -> Self {
        let mut machine_utilization = BTreeMap::new();
        let mut machine_load = BTreeMap::new();

        for machine in machines {
            let (busy, count) = schedule
                .assignments()
                .filter(|(_, a)| a.machine == machine.id)
                .fold((0i64, 0usize), |(busy, count), (_, a)| {
                    (busy + a.duration(), count + 1)
                });

            let utilization = if schedule.makespan > 0 {
                busy as f64 / schedule.makespan as f64 * 100.0
            } else {
                0.0
            };
            machine_utilization.insert(machine.id.clone(), utilization);
            machine_load.insert(machine.id.clone(), count);
        }

        let job_durations = schedule
            .jobs
            .iter()
            .filter_map(|job| Some((job.job_id.clone(), job.span()?)))
            .collect();

        Self {
            makespan: schedule.makespan,
            total_jobs: schedule.jobs.len(),
            machine_utilization,
            job_durations,
            machine_load,
        }
    }

    /// Mean utilization over all listed machines.
    pub fn average_utilization(&self) -> f64 {
        if self.machine_utilization.is_empty() {
            0.0
        } else {
            self.machine_utilization.values().sum::<f64>() / self.machine_utilization.len() as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Assignment, JobSchedule};

    fn machines() -> Vec<Machine> {
        vec![
            Machine::new("M1").with_capability("cutting"),
            Machine::new("M2").with_capability("welding"),
            Machine::new("M3").with_capability("painting"),
        ]
    }

    #[test]
    fn test_stats_basic() {
        let schedule = Schedule::new()
            .with_job(
                JobSchedule::new("J1")
                    .with_assignment(Assignment::new("cutting", "M1", 0, 45))
                    .with_assignment(Assignment::new("welding", "M2", 45, 105)),
            )
            .with_job(JobSchedule::new("J2").with_assignment(Assignment::new("cutting", "M1", 45, 90)))
            .with_computed_makespan();

        let stats = ScheduleStatistics::calculate(&schedule, &machines());
        assert_eq!(stats.makespan, 105);
        assert_eq!(stats.total_jobs, 2);
        assert_eq!(stats.machine_load["M1"], 2);
        assert_eq!(stats.machine_load["M2"], 1);
        assert_eq!(stats.machine_load["M3"], 0);
        // M1: 90/105, M2: 60/105
        assert!((stats.machine_utilization["M1"] - 90.0 / 105.0 * 100.0).abs() < 1e-10);
        assert!((stats.machine_utilization["M2"] - 60.0 / 105.0 * 100.0).abs() < 1e-10);
        assert!((stats.machine_utilization["M3"] - 0.0).abs() < 1e-10);
        assert_eq!(stats.job_durations["J1"], 105);
        assert_eq!(stats.job_durations["J2"], 45);
    }

    #[test]
    fn test_stats_zero_makespan() {
        let schedule = Schedule::new()
            .with_job(JobSchedule::new("J1").with_assignment(Assignment::new("testing", "M1", 0, 0)))
            .with_computed_makespan();

        let stats = ScheduleStatistics::calculate(&schedule, &machines());
        assert_eq!(stats.makespan, 0);
        assert!(stats.machine_utilization.values().all(|&u| u == 0.0));
        assert_eq!(stats.machine_load["M1"], 1);
    }

    #[test]
    fn test_stats_empty() {
        let stats = ScheduleStatistics::calculate(&Schedule::new(), &[]);
        assert_eq!(stats.total_jobs, 0);
        assert!(stats.machine_utilization.is_empty());
        assert!(stats.job_durations.is_empty());
        assert!((stats.average_utilization() - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_job_without_assignments_has_no_duration() {
        let schedule = Schedule::new().with_job(JobSchedule::new("J1"));
        let stats = ScheduleStatistics::calculate(&schedule, &machines());
        assert_eq!(stats.total_jobs, 1);
        assert!(!stats.job_durations.contains_key("J1"));
    }

    #[test]
    fn test_stats_wire_shape() {
        let schedule = Schedule::new()
            .with_job(JobSchedule::new("J1").with_assignment(Assignment::new("cutting", "M1", 0, 50)))
            .with_computed_makespan();
        let stats = ScheduleStatistics::calculate(&schedule, &machines()[..1]);

        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "makespan": 50,
                "total_jobs": 1,
                "machine_utilization": { "M1": 100.0 },
                "job_durations": { "J1": 50 },
                "machine_load": { "M1": 1 }
            })
        );
    }
}
