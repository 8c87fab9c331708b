//! Search network, trail-based search state, and bound propagation.
//!
//! The constraint list is compiled once into a [`Network`]: per-operation
//! slot data, operation-level precedence arcs, a topological order, and
//! static tails (shortest remaining chain after each operation). Search
//! nodes are then propagated against it without touching the model.

use std::collections::VecDeque;

use super::model::{Constraint, CpModel};
use super::solver::SlotAssignment;

/// Static data of one candidate slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SlotInfo {
    pub machine: usize,
    pub duration: i64,
    pub min_start: i64,
    pub max_end: i64,
}

/// Static data of one operation.
#[derive(Debug, Clone, Default)]
pub(crate) struct OpInfo {
    pub slots: Vec<SlotInfo>,
    pub preds: Vec<usize>,
    pub succs: Vec<usize>,
    pub min_duration: i64,
}

/// The model compiled for search.
///
/// Slot-level precedences are lifted to their operations, and a
/// `NoOverlap` marks its whole machine as exclusive. Machines with at most
/// one slot are exclusive trivially.
#[derive(Debug, Clone)]
pub(crate) struct Network {
    pub ops: Vec<OpInfo>,
    pub topo: Vec<usize>,
    pub tail: Vec<i64>,
    pub exclusive: Vec<bool>,
    pub all_exclusive: bool,
    pub horizon: i64,
}

impl Network {
    pub fn compile(model: &CpModel) -> Result<Self, String> {
        model.validate()?;

        let mut ops: Vec<OpInfo> = model
            .operations
            .iter()
            .map(|node| OpInfo {
                slots: node
                    .candidates
                    .iter()
                    .map(|c| SlotInfo {
                        machine: c.machine,
                        duration: c.interval.duration,
                        min_start: c.interval.start.min.max(0),
                        max_end: c.interval.end.max.min(model.horizon),
                    })
                    .collect(),
                preds: Vec::new(),
                succs: Vec::new(),
                min_duration: node.min_duration(),
            })
            .collect();

        if let Some(op) = ops.iter().position(|o| o.slots.is_empty()) {
            return Err(format!("operation {op} has no candidate slot"));
        }

        let mut exclusive: Vec<bool> = (0..model.machines.len())
            .map(|m| model.slots_on_machine(m).len() <= 1)
            .collect();

        for constraint in &model.constraints {
            match constraint {
                Constraint::ConditionalPrecedence { before, after } => {
                    if before.op == after.op {
                        return Err(format!("operation {} precedes itself", before.op));
                    }
                    if !ops[after.op].preds.contains(&before.op) {
                        ops[after.op].preds.push(before.op);
                        ops[before.op].succs.push(after.op);
                    }
                }
                Constraint::NoOverlap { machine, .. } => exclusive[*machine] = true,
                Constraint::ReleaseTime { slot, min_start } => {
                    let info = &mut ops[slot.op].slots[slot.slot];
                    info.min_start = info.min_start.max(*min_start);
                }
                Constraint::ExactlyOne { .. } | Constraint::MakespanBound { .. } => {}
            }
        }

        let topo = topological_order(&ops).ok_or_else(|| "precedence cycle".to_string())?;

        let mut tail = vec![0i64; ops.len()];
        for &op in topo.iter().rev() {
            let longest = ops[op]
                .succs
                .iter()
                .map(|&s| ops[s].min_duration.saturating_add(tail[s]))
                .max()
                .unwrap_or(0);
            tail[op] = longest;
        }

        let all_exclusive = exclusive.iter().all(|&e| e);
        Ok(Self {
            ops,
            topo,
            tail,
            exclusive,
            all_exclusive,
            horizon: model.horizon,
        })
    }

    pub fn machine_count(&self) -> usize {
        self.exclusive.len()
    }

    pub fn slot(&self, op: usize, slot: usize) -> &SlotInfo {
        &self.ops[op].slots[slot]
    }
}

/// Kahn's algorithm, ties broken by operation index.
fn topological_order(ops: &[OpInfo]) -> Option<Vec<usize>> {
    let mut indegree: Vec<usize> = ops.iter().map(|o| o.preds.len()).collect();
    let mut queue: VecDeque<usize> = (0..ops.len()).filter(|&op| indegree[op] == 0).collect();
    let mut order = Vec::with_capacity(ops.len());

    while let Some(op) = queue.pop_front() {
        order.push(op);
        for &succ in &ops[op].succs {
            indegree[succ] -= 1;
            if indegree[succ] == 0 {
                queue.push_back(succ);
            }
        }
    }

    (order.len() == ops.len()).then_some(order)
}

/// A branching decision: place `op` on its `slot` at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Move {
    pub op: usize,
    pub slot: usize,
    pub start: i64,
    pub end: i64,
}

#[derive(Debug, Clone, Copy)]
struct Undo {
    op: usize,
    machine: usize,
    machine_ready: i64,
    last_start: i64,
    makespan: i64,
}

/// Partial schedule under construction, with an undo trail.
#[derive(Debug, Clone)]
pub(crate) struct SearchState {
    pub choice: Vec<Option<SlotAssignment>>,
    pub machine_ready: Vec<i64>,
    pub last_start: i64,
    pub makespan: i64,
    scheduled: usize,
    trail: Vec<Undo>,
}

impl SearchState {
    pub fn new(network: &Network) -> Self {
        Self {
            choice: vec![None; network.ops.len()],
            machine_ready: vec![0; network.machine_count()],
            last_start: 0,
            makespan: 0,
            scheduled: 0,
            trail: Vec::with_capacity(network.ops.len()),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.scheduled == self.choice.len()
    }

    pub fn apply(&mut self, network: &Network, mv: Move) {
        let machine = network.slot(mv.op, mv.slot).machine;
        self.trail.push(Undo {
            op: mv.op,
            machine,
            machine_ready: self.machine_ready[machine],
            last_start: self.last_start,
            makespan: self.makespan,
        });

        self.choice[mv.op] = Some(SlotAssignment {
            slot: mv.slot,
            start: mv.start,
            end: mv.end,
        });
        if mv.end > mv.start {
            self.machine_ready[machine] = self.machine_ready[machine].max(mv.end);
        }
        self.last_start = self.last_start.max(mv.start);
        self.makespan = self.makespan.max(mv.end);
        self.scheduled += 1;
    }

    pub fn undo(&mut self) {
        if let Some(undo) = self.trail.pop() {
            self.choice[undo.op] = None;
            self.machine_ready[undo.machine] = undo.machine_ready;
            self.last_start = undo.last_start;
            self.makespan = undo.makespan;
            self.scheduled -= 1;
        }
    }
}

/// Per-node bound propagation with reusable scratch buffers.
#[derive(Debug, Clone)]
pub(crate) struct Propagator {
    /// Actual end of scheduled ops, earliest completion of the rest.
    finish: Vec<i64>,
    forced_load: Vec<i64>,
    forced_start: Vec<i64>,
    forced_tail: Vec<i64>,
}

impl Propagator {
    pub fn new(network: &Network) -> Self {
        let machines = network.machine_count();
        Self {
            finish: vec![0; network.ops.len()],
            forced_load: vec![0; machines],
            forced_start: vec![i64::MAX; machines],
            forced_tail: vec![i64::MAX; machines],
        }
    }

    /// Propagates the node and returns a makespan lower bound, or `None`
    /// when some unscheduled operation has no slot left that can finish
    /// within its horizon and beat `upper_bound`.
    ///
    /// Branching moves for eligible operations (all predecessors placed)
    /// are pushed to `moves`, sorted by `(end, start, op, slot)`.
    ///
    /// Every future start is at least `state.last_start`, so heads are
    /// raised to it. The bound is the maximum of:
    /// - the partial makespan
    /// - earliest completion plus tail, per operation
    /// - per exclusive machine, the operations forced onto it run back to back
    /// - the energy bound over all machines, when every machine is exclusive
    pub fn propagate(
        &mut self,
        network: &Network,
        state: &SearchState,
        upper_bound: i64,
        moves: &mut Vec<Move>,
    ) -> Option<i64> {
        self.forced_load.fill(0);
        self.forced_start.fill(i64::MAX);
        self.forced_tail.fill(i64::MAX);

        let mut lower_bound = state.makespan;
        let mut remaining_work = 0i64;

        for &op in &network.topo {
            if let Some(placed) = state.choice[op] {
                self.finish[op] = placed.end;
                continue;
            }

            let info = &network.ops[op];
            let tail = network.tail[op];
            let mut head = state.last_start;
            let mut eligible = true;
            for &pred in &info.preds {
                head = head.max(self.finish[pred]);
                eligible &= state.choice[pred].is_some();
            }

            let mut earliest_end = i64::MAX;
            let mut min_duration = i64::MAX;
            let mut alive = 0usize;
            let mut only: Option<(usize, i64)> = None;

            for (slot, s) in info.slots.iter().enumerate() {
                let mut start = head.max(s.min_start);
                // Zero-length intervals overlap nothing and may sit inside busy time
                if s.duration > 0 && network.exclusive[s.machine] {
                    start = start.max(state.machine_ready[s.machine]);
                }
                let end = start.saturating_add(s.duration);
                if end > s.max_end || end.saturating_add(tail) >= upper_bound {
                    continue;
                }

                alive += 1;
                earliest_end = earliest_end.min(end);
                min_duration = min_duration.min(s.duration);
                only = Some((slot, start));
                if eligible {
                    moves.push(Move { op, slot, start, end });
                }
            }

            if alive == 0 {
                return None;
            }

            self.finish[op] = earliest_end;
            lower_bound = lower_bound.max(earliest_end.saturating_add(tail));
            remaining_work = remaining_work.saturating_add(min_duration);

            if let (1, Some((slot, start))) = (alive, only) {
                let s = network.slot(op, slot);
                if s.duration > 0 && network.exclusive[s.machine] {
                    self.forced_load[s.machine] = self.forced_load[s.machine].saturating_add(s.duration);
                    self.forced_start[s.machine] = self.forced_start[s.machine].min(start);
                    self.forced_tail[s.machine] = self.forced_tail[s.machine].min(tail);
                }
            }
        }

        for m in 0..network.machine_count() {
            if self.forced_start[m] != i64::MAX {
                let finish = self.forced_start[m]
                    .saturating_add(self.forced_load[m])
                    .saturating_add(self.forced_tail[m]);
                lower_bound = lower_bound.max(finish);
            }
        }

        let machines = network.machine_count() as i64;
        if network.all_exclusive && machines > 0 {
            let energy = state
                .machine_ready
                .iter()
                .fold(remaining_work, |acc, &ready| acc.saturating_add(ready));
            lower_bound = lower_bound.max(energy.saturating_add(machines - 1) / machines);
        }

        moves.sort_unstable_by_key(|m| (m.end, m.start, m.op, m.slot));
        Some(lower_bound)
    }
}
