//! CP solver interface and the branch-and-bound implementation.
//!
//! # Algorithm
//!
//! 1. Compile the model into an operation-level precedence network.
//! 2. Seed the incumbent with a greedy earliest-completion schedule.
//! 3. Depth-first search over `(operation, slot)` append decisions taken in
//!    non-decreasing start order. Every node is propagated: heads are pushed
//!    forward along precedences and machine availability, slots that cannot
//!    beat the incumbent are filtered, and the node is cut when a slot set
//!    wipes out or a makespan lower bound reaches the incumbent.
//!
//! Move ordering and pruning never read the clock, so the sequence of
//! visited nodes is fixed by the model alone. The budget only decides how
//! long a prefix of that sequence is explored.
//!
//! # Reference
//! - Brucker, Jurisch & Sievers (1994), "A branch and bound algorithm for the job-shop scheduling problem"
//! - Giffler & Thompson (1960), "Algorithms for solving production-scheduling problems"

use std::time::{Duration, Instant};

use tracing::Span;

use super::heuristic::greedy_schedule;
use super::model::CpModel;
use super::propagation::{Move, Network, Propagator, SearchState};

/// Number of nodes between two deadline checks.
const DEADLINE_CHECK_INTERVAL: u64 = 64;

/// Status of the solver after execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    /// Search completed; the returned schedule has minimum makespan.
    Optimal,
    /// A schedule was found but the budget ran out before a proof.
    Feasible,
    /// Search completed without finding any schedule.
    Infeasible,
    /// Budget ran out before any schedule was found.
    Unknown,
}

/// The chosen slot of one operation and its placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotAssignment {
    /// Index into the operation's candidate slots.
    pub slot: usize,
    /// Start time.
    pub start: i64,
    /// End time.
    pub end: i64,
}

/// Solution from a CP solver.
#[derive(Debug, Clone, PartialEq)]
pub struct CpSolution {
    /// Solver status.
    pub status: SolverStatus,
    /// Makespan of the returned assignment.
    pub objective_value: Option<i64>,
    /// Per-operation assignment, indexed like `CpModel::operations`.
    pub assignments: Vec<Option<SlotAssignment>>,
    /// Search nodes visited.
    pub nodes_explored: u64,
    /// Wall-clock time spent.
    pub solve_time: Duration,
}

impl CpSolution {
    /// Creates an empty solution with the given status.
    pub fn empty(status: SolverStatus) -> Self {
        Self {
            status,
            objective_value: None,
            assignments: Vec::new(),
            nodes_explored: 0,
            solve_time: Duration::ZERO,
        }
    }

    /// Whether a feasible solution was found.
    pub fn is_solution_found(&self) -> bool {
        matches!(self.status, SolverStatus::Optimal | SolverStatus::Feasible)
    }

    /// Whether the presence literal of `(op, slot)` is true.
    pub fn is_present(&self, op: usize, slot: usize) -> bool {
        matches!(self.assignments.get(op), Some(Some(a)) if a.slot == slot)
    }

    /// Returns the maximum end time across all present intervals.
    pub fn max_end(&self) -> i64 {
        self.assignments
            .iter()
            .flatten()
            .map(|a| a.end)
            .max()
            .unwrap_or(0)
    }
}

/// Solver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    /// Maximum wall-clock solve time.
    pub time_limit: Duration,
    /// Maximum number of search nodes, if any.
    pub node_limit: Option<u64>,
    /// Stop after finding the first feasible solution.
    pub stop_after_first: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(60),
            node_limit: None,
            stop_after_first: false,
        }
    }
}

impl SolverConfig {
    /// Sets the time limit.
    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    /// Sets the node limit.
    pub fn with_node_limit(mut self, node_limit: Option<u64>) -> Self {
        self.node_limit = node_limit;
        self
    }

    /// Stops at the first feasible solution.
    pub fn with_stop_after_first(mut self, stop: bool) -> Self {
        self.stop_after_first = stop;
        self
    }
}

/// Trait for CP solver implementations.
///
/// Implementors take a compiled model and a budget and report a status
/// plus, when one was found, a per-operation slot assignment.
pub trait CpSolver {
    /// Solves the model and returns a solution.
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution;
}

/// Anytime depth-first branch-and-bound minimizing makespan.
///
/// Single-threaded and deterministic: two runs on the same model with the
/// same node limit visit the same nodes and return the same schedule.
#[derive(Debug, Clone)]
pub struct BranchAndBoundSolver {
    span: Span,
}

impl BranchAndBoundSolver {
    pub fn new() -> Self {
        Self { span: Span::none() }
    }

    /// Emits search events under `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl Default for BranchAndBoundSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CpSolver for BranchAndBoundSolver {
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution {
        let started = Instant::now();

        let network = match Network::compile(model) {
            Ok(network) => network,
            Err(reason) => {
                tracing::warn!(parent: &self.span, %reason, "model rejected by solver");
                return CpSolution {
                    solve_time: started.elapsed(),
                    ..CpSolution::empty(SolverStatus::Infeasible)
                };
            }
        };

        let mut search = Search::new(&network, config, started, &self.span);
        if let Some(seed) = greedy_schedule(&network) {
            search.record(seed.into_iter().map(Some).collect());
        }

        if config.stop_after_first && search.incumbent.is_some() {
            search.stopped = true;
        } else {
            search.dfs();
        }

        let status = match (search.stopped, search.incumbent.is_some()) {
            (false, true) => SolverStatus::Optimal,
            (false, false) => SolverStatus::Infeasible,
            (true, true) => SolverStatus::Feasible,
            (true, false) => SolverStatus::Unknown,
        };

        let objective_value = search.incumbent.as_ref().map(|_| search.upper_bound);
        tracing::debug!(
            parent: &self.span,
            ?status,
            nodes = search.nodes,
            makespan = ?objective_value,
            "search finished"
        );

        CpSolution {
            status,
            objective_value,
            assignments: search.incumbent.unwrap_or_default(),
            nodes_explored: search.nodes,
            solve_time: started.elapsed(),
        }
    }
}

struct Search<'a> {
    network: &'a Network,
    state: SearchState,
    propagator: Propagator,
    incumbent: Option<Vec<Option<SlotAssignment>>>,
    /// Makespan of the incumbent, or `horizon + 1` before one exists.
    upper_bound: i64,
    nodes: u64,
    deadline: Option<Instant>,
    node_limit: Option<u64>,
    stop_after_first: bool,
    stopped: bool,
    span: &'a Span,
}

impl<'a> Search<'a> {
    fn new(network: &'a Network, config: &SolverConfig, started: Instant, span: &'a Span) -> Self {
        Self {
            network,
            state: SearchState::new(network),
            propagator: Propagator::new(network),
            incumbent: None,
            upper_bound: network.horizon.saturating_add(1),
            nodes: 0,
            deadline: started.checked_add(config.time_limit),
            node_limit: config.node_limit,
            stop_after_first: config.stop_after_first,
            stopped: false,
            span,
        }
    }

    fn record(&mut self, assignments: Vec<Option<SlotAssignment>>) {
        let makespan = assignments.iter().flatten().map(|a| a.end).max().unwrap_or(0);
        if makespan < self.upper_bound {
            tracing::debug!(parent: self.span, makespan, nodes = self.nodes, "new incumbent");
            self.upper_bound = makespan;
            self.incumbent = Some(assignments);
        }
    }

    fn budget_spent(&self) -> bool {
        if self.node_limit.is_some_and(|limit| self.nodes >= limit) {
            return true;
        }
        self.nodes % DEADLINE_CHECK_INTERVAL == 0
            && self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    fn dfs(&mut self) {
        if self.budget_spent() {
            self.stopped = true;
            return;
        }
        self.nodes += 1;

        if self.state.is_complete() {
            if self.state.makespan < self.upper_bound {
                let assignments = self.state.choice.clone();
                self.record(assignments);
                if self.stop_after_first {
                    self.stopped = true;
                }
            }
            return;
        }

        let mut moves: Vec<Move> = Vec::new();
        let Some(lower_bound) =
            self.propagator
                .propagate(self.network, &self.state, self.upper_bound, &mut moves)
        else {
            return;
        };
        if lower_bound >= self.upper_bound {
            return;
        }

        for mv in moves {
            // The incumbent may have improved in an earlier sibling
            if mv.end.saturating_add(self.network.tail[mv.op]) >= self.upper_bound {
                continue;
            }
            self.state.apply(self.network, mv);
            self.dfs();
            self.state.undo();
            if self.stopped {
                return;
            }
        }
    }
}
