//! Scheduler binding - one-shot, delay-ordered task invocations.
//!
//! The keypad never sleeps; it asks the cooperative scheduler to call it
//! again later. Each task handle owns at most one pending request:
//! scheduling again replaces it, and cancelling an idle handle is a no-op.
//!
//! [`TimerQueue`] is a small fixed-capacity implementation of that contract
//! for run loops that poll a tick counter. The firmware binary binds the
//! same trait to `embassy-time` instead.

use core::cmp::Reverse;

use heapless::Vec;

/// Scheduler time base (nominally milliseconds).
///
/// Elapsed times are computed with wrapping arithmetic, so the counter may
/// roll over as long as no single timing window spans a full period.
pub type Tick = u32;

/// Handle naming one schedulable task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskId(pub u8);

/// Handle used by the keypad for its rescan timer.
pub const KEYPAD_TASK: TaskId = TaskId(0);

/// One-shot task scheduling.
pub trait Scheduler {
    /// Invoke `task` with `payload` after `delay` ticks, replacing any
    /// request already pending for `task`.
    fn schedule(&mut self, task: TaskId, payload: u32, delay: Tick);

    /// Drop the pending request for `task`, if any.
    fn deschedule(&mut self, task: TaskId);
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    task: TaskId,
    payload: u32,
    due: Tick,
    seq: u32,
}

/// Fixed-capacity one-shot timer queue.
pub struct TimerQueue<const N: usize> {
    entries: Vec<Entry, N>,
    now: Tick,
    seq: u32,
}

impl<const N: usize> TimerQueue<N> {
    /// Create an empty queue starting at tick 0.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            now: 0,
            seq: 0,
        }
    }

    /// Move the queue's notion of "now" forward.
    pub fn advance(&mut self, now: Tick) {
        self.now = now;
    }

    /// Remove and return the most overdue request, if any is due.
    ///
    /// Earlier deadlines fire first; equal deadlines fire in request order.
    pub fn pop_due(&mut self) -> Option<(TaskId, u32)> {
        let now = self.now;
        let (idx, _) = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| Self::remaining(now, e.due) == 0)
            .min_by_key(|(_, e)| (Reverse(now.wrapping_sub(e.due)), e.seq))?;
        let entry = self.entries.swap_remove(idx);
        Some((entry.task, entry.payload))
    }

    /// `true` if `task` has a pending request.
    pub fn is_pending(&self, task: TaskId) -> bool {
        self.entries.iter().any(|e| e.task == task)
    }

    /// Ticks until `task` fires, if it is pending.
    pub fn due_in(&self, task: TaskId) -> Option<Tick> {
        self.entries
            .iter()
            .find(|e| e.task == task)
            .map(|e| Self::remaining(self.now, e.due))
    }

    /// Number of pending requests.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remaining(now: Tick, due: Tick) -> Tick {
        let left = due.wrapping_sub(now);
        // Deadlines more than half a period "ahead" are really overdue.
        if left > Tick::MAX / 2 {
            0
        } else {
            left
        }
    }
}

impl<const N: usize> Default for TimerQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Scheduler for TimerQueue<N> {
    fn schedule(&mut self, task: TaskId, payload: u32, delay: Tick) {
        let entry = Entry {
            task,
            payload,
            due: self.now.wrapping_add(delay),
            seq: self.seq,
        };
        self.seq = self.seq.wrapping_add(1);

        if let Some(existing) = self.entries.iter_mut().find(|e| e.task == task) {
            *existing = entry;
            return;
        }
        if self.entries.push(entry).is_err() {
            warn!("TimerQueue: full, dropping request for task {}", task.0);
        }
    }

    fn deschedule(&mut self, task: TaskId) {
        self.entries.retain(|e| e.task != task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: TaskId = TaskId(1);
    const B: TaskId = TaskId(2);

    #[test]
    fn fires_only_once_due() {
        let mut q: TimerQueue<4> = TimerQueue::new();
        q.schedule(A, 7, 10);
        q.advance(9);
        assert_eq!(q.pop_due(), None);
        q.advance(10);
        assert_eq!(q.pop_due(), Some((A, 7)));
        assert_eq!(q.pop_due(), None);
        assert!(q.is_empty());
    }

    #[test]
    fn reschedule_replaces_instead_of_stacking() {
        let mut q: TimerQueue<4> = TimerQueue::new();
        q.schedule(A, 0, 100);
        q.schedule(A, 1, 5);
        assert_eq!(q.len(), 1);
        assert_eq!(q.due_in(A), Some(5));
        q.advance(200);
        assert_eq!(q.pop_due(), Some((A, 1)));
        assert_eq!(q.pop_due(), None);
    }

    #[test]
    fn lower_delay_fires_first() {
        let mut q: TimerQueue<4> = TimerQueue::new();
        q.schedule(A, 0, 30);
        q.schedule(B, 0, 20);
        q.advance(50);
        assert_eq!(q.pop_due().map(|(t, _)| t), Some(B));
        assert_eq!(q.pop_due().map(|(t, _)| t), Some(A));
    }

    #[test]
    fn equal_deadlines_keep_request_order() {
        let mut q: TimerQueue<4> = TimerQueue::new();
        q.schedule(B, 0, 10);
        q.schedule(A, 0, 10);
        q.advance(10);
        assert_eq!(q.pop_due().map(|(t, _)| t), Some(B));
        assert_eq!(q.pop_due().map(|(t, _)| t), Some(A));
    }

    #[test]
    fn deschedule_is_idempotent() {
        let mut q: TimerQueue<4> = TimerQueue::new();
        q.deschedule(A);
        q.schedule(A, 0, 1);
        q.deschedule(A);
        q.deschedule(A);
        assert!(!q.is_pending(A));
        q.advance(5);
        assert_eq!(q.pop_due(), None);
    }

    #[test]
    fn deadlines_survive_tick_wraparound() {
        let mut q: TimerQueue<4> = TimerQueue::new();
        q.advance(Tick::MAX - 5);
        q.schedule(A, 3, 10);
        q.advance(Tick::MAX);
        assert_eq!(q.pop_due(), None);
        q.advance(4);
        assert_eq!(q.pop_due(), Some((A, 3)));
    }

    #[test]
    fn full_queue_drops_new_handles() {
        let mut q: TimerQueue<1> = TimerQueue::new();
        q.schedule(A, 0, 1);
        q.schedule(B, 0, 1);
        assert!(q.is_pending(A));
        assert!(!q.is_pending(B));
    }
}
