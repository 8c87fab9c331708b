//! Greedy warm start.
//!
//! Repeatedly places the eligible `(operation, slot)` pair with the earliest
//! completion, appending to the machine's queue. Zero-length operations do
//! not occupy their machine. Ties go to the earlier start, then the lower
//! operation index, then the lower slot index.

use super::propagation::Network;
use super::solver::SlotAssignment;

/// Builds an earliest-completion schedule, or `None` if some operation
/// cannot finish within its slot bounds.
pub(crate) fn greedy_schedule(network: &Network) -> Option<Vec<SlotAssignment>> {
    let n = network.ops.len();
    let mut placed: Vec<Option<SlotAssignment>> = vec![None; n];
    let mut pending: Vec<usize> = network.ops.iter().map(|o| o.preds.len()).collect();
    let mut machine_ready = vec![0i64; network.machine_count()];

    for _ in 0..n {
        let mut best: Option<(i64, i64, usize, usize)> = None;

        for (op, info) in network.ops.iter().enumerate() {
            if placed[op].is_some() || pending[op] > 0 {
                continue;
            }
            let ready = info
                .preds
                .iter()
                .filter_map(|&p| placed[p].map(|a| a.end))
                .max()
                .unwrap_or(0);

            for (slot, s) in info.slots.iter().enumerate() {
                let mut start = ready.max(s.min_start);
                if s.duration > 0 {
                    start = start.max(machine_ready[s.machine]);
                }
                let end = start.saturating_add(s.duration);
                if end > s.max_end {
                    continue;
                }
                let key = (end, start, op, slot);
                if best.map_or(true, |b| key < b) {
                    best = Some(key);
                }
            }
        }

        let (end, start, op, slot) = best?;
        placed[op] = Some(SlotAssignment { slot, start, end });
        if end > start {
            let machine = network.slot(op, slot).machine;
            machine_ready[machine] = machine_ready[machine].max(end);
        }
        for &succ in &network.ops[op].succs {
            pending[succ] -= 1;
        }
    }

    placed.into_iter().collect()
}
