//! Deferred recognizer callbacks bound to a contact generation.

use crate::exclusion::RecognizerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTask {
    pub due_ms: u64,
    pub owner: RecognizerId,
    /// Contact generation the task was scheduled against.
    pub generation: u64,
}

/// Tasks kept sorted by due time; ties fire in scheduling order.
#[derive(Debug, Default)]
pub struct TimerQueue {
    tasks: Vec<ScheduledTask>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, task: ScheduledTask) {
        let at = self.tasks.partition_point(|t| t.due_ms <= task.due_ms);
        self.tasks.insert(at, task);
    }

    pub fn cancel_owner(&mut self, owner: RecognizerId) {
        self.tasks.retain(|t| t.owner != owner);
    }

    /// Removes and returns every task due at or before `now_ms`.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<ScheduledTask> {
        let n = self.tasks.partition_point(|t| t.due_ms <= now_ms);
        self.tasks.drain(..n).collect()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.tasks.first().map(|t| t.due_ms)
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.tasks.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(due_ms: u64, owner: usize) -> ScheduledTask {
        ScheduledTask {
            due_ms,
            owner: RecognizerId(owner),
            generation: 1,
        }
    }

    #[test]
    fn fires_in_due_order() {
        let mut q = TimerQueue::new();
        q.schedule(task(300, 0));
        q.schedule(task(100, 1));
        q.schedule(task(200, 2));
        q.schedule(task(100, 3));
        assert_eq!(q.next_deadline(), Some(100));

        let due: Vec<_> = q.take_due(200).iter().map(|t| t.owner.0).collect();
        assert_eq!(due, vec![1, 3, 2]);
        assert_eq!(q.len(), 1);
        assert!(q.take_due(299).is_empty());
    }

    #[test]
    fn cancel_drops_only_that_owner() {
        let mut q = TimerQueue::new();
        q.schedule(task(100, 0));
        q.schedule(task(100, 1));
        q.cancel_owner(RecognizerId(0));
        assert_eq!(q.take_due(100), vec![task(100, 1)]);
        assert!(q.is_empty());
    }
}
