//! Cancellable scheduled tasks on the scene clock
//!
//! Single-threaded: tasks are plain payloads returned by `poll_due` when their
//! deadline has passed. A cancelled handle never fires.

/// Opaque handle returned by `Scheduler::schedule`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Task<T> {
    handle: TimerHandle,
    due: f64,
    payload: T,
}

/// Deadline-ordered task list
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    tasks: Vec<Task<T>>,
    next_handle: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            next_handle: 1,
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `payload` to fire `delay` seconds after `now`
    pub fn schedule(&mut self, now: f64, delay: f64, payload: T) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.tasks.push(Task {
            handle,
            due: now + delay.max(0.0),
            payload,
        });
        handle
    }

    /// Cancel a pending task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.handle != handle);
        self.tasks.len() != before
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Remove and return every task due at or before `now`, earliest first
    pub fn poll_due(&mut self, now: f64) -> Vec<(TimerHandle, T)> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.tasks.len() {
            if self.tasks[i].due <= now {
                due.push(self.tasks.swap_remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.handle.0.cmp(&b.handle.0)));
        due.into_iter().map(|t| (t.handle, t.payload)).collect()
    }

    /// Drop every pending task
    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_due_in_deadline_order() {
        let mut s = Scheduler::new();
        s.schedule(0.0, 2.0, "late");
        s.schedule(0.0, 1.0, "early");
        s.schedule(0.0, 5.0, "pending");
        let fired: Vec<_> = s.poll_due(3.0).into_iter().map(|(_, p)| p).collect();
        assert_eq!(fired, vec!["early", "late"]);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_cancelled_task_never_fires() {
        let mut s = Scheduler::new();
        let h = s.schedule(0.0, 1.0, ());
        assert!(s.cancel(h));
        assert!(!s.cancel(h));
        assert!(s.poll_due(10.0).is_empty());
    }

    #[test]
    fn test_fired_task_cannot_be_cancelled() {
        let mut s = Scheduler::new();
        let h = s.schedule(0.0, 0.5, 1u8);
        assert_eq!(s.poll_due(1.0).len(), 1);
        assert!(s.is_empty());
        assert!(!s.cancel(h));
    }
}
