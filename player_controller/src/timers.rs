//! One-shot deferred actions advanced by the controller tick.

use rapier3d::prelude::Real;

/// Absorbs float drift when a delay is an exact multiple of the tick length.
const DUE_EPSILON: Real = 1.0e-5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerAction {
    EndRoll,
    RollReady,
}

#[derive(Clone, Copy, Debug)]
struct PendingTimer {
    remaining: Real,
    seq: u64,
    action: TimerAction,
}

#[derive(Debug, Default)]
pub struct TimerManager {
    pending: Vec<PendingTimer>,
    next_seq: u64,
}

impl TimerManager {
    pub fn schedule(&mut self, delay: Real, action: TimerAction) {
        let remaining = if delay.is_finite() { delay.max(0.0) } else { 0.0 };
        self.pending.push(PendingTimer {
            remaining,
            seq: self.next_seq,
            action,
        });
        self.next_seq = self.next_seq.wrapping_add(1);
    }

    /// Advances every timer by `dt` and returns the actions that came due,
    /// earliest due first, ties in scheduling order.
    pub fn advance(&mut self, dt: Real) -> Vec<TimerAction> {
        let dt = dt.max(0.0);
        let mut due = Vec::new();
        self.pending.retain_mut(|timer| {
            timer.remaining -= dt;
            if timer.remaining <= DUE_EPSILON {
                due.push(*timer);
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| {
            a.remaining
                .total_cmp(&b.remaining)
                .then(a.seq.cmp(&b.seq))
        });
        due.into_iter().map(|timer| timer.action).collect()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }
}
