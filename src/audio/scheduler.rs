//! Cooperative per-frame task list.
//!
//! Tasks are plain values owned by the scheduler and polled once per tick.
//! The owner drives a tick in three steps:
//!
//! 1. [`Scheduler::begin_tick`] takes the current batch out,
//! 2. each task is polled by the owner, who may spawn or cancel tasks while
//!    doing so (including the one being polled), and hands pending ones back
//!    with [`Scheduler::resume`],
//! 3. [`Scheduler::end_tick`] merges the survivors with anything spawned
//!    during the tick.
//!
//! Tasks spawned mid-tick are first polled on the following tick.

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// Outcome of polling one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    Pending,
    Done,
}

#[derive(Debug)]
pub struct Scheduler<T> {
    next_id: u64,
    queued: Vec<(TaskId, T)>,
    in_flight: HashSet<TaskId>,
    cancelled: HashSet<TaskId>,
    resumed: Vec<(TaskId, T)>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            queued: Vec::new(),
            in_flight: HashSet::new(),
            cancelled: HashSet::new(),
            resumed: Vec::new(),
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, task: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.queued.push((id, task));
        id
    }

    /// Cancel a task. Unknown, finished and already-cancelled ids are ignored.
    pub fn cancel(&mut self, id: TaskId) {
        if let Some(idx) = self.queued.iter().position(|(qid, _)| *qid == id) {
            self.queued.remove(idx);
        } else if let Some(idx) = self.resumed.iter().position(|(rid, _)| *rid == id) {
            self.resumed.remove(idx);
            self.cancelled.insert(id);
        } else if self.in_flight.contains(&id) {
            self.cancelled.insert(id);
        }
    }

    pub fn is_scheduled(&self, id: TaskId) -> bool {
        (self.in_flight.contains(&id) && !self.cancelled.contains(&id))
            || self.queued.iter().any(|(qid, _)| *qid == id)
    }

    /// Number of tasks waiting for the next tick.
    pub fn len(&self) -> usize {
        self.queued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.queued.iter().map(|(_, task)| task)
    }

    /// Take the batch to poll this tick.
    pub fn begin_tick(&mut self) -> Vec<(TaskId, T)> {
        let batch = std::mem::take(&mut self.queued);
        self.in_flight.extend(batch.iter().map(|(id, _)| *id));
        batch
    }

    /// Whether a task from the current batch was cancelled after it was taken.
    pub fn is_cancelled(&self, id: TaskId) -> bool {
        self.cancelled.contains(&id)
    }

    /// Hand a polled task back. Cancelled tasks are dropped.
    pub fn resume(&mut self, id: TaskId, task: T) {
        if !self.cancelled.contains(&id) {
            self.resumed.push((id, task));
        }
    }

    pub fn end_tick(&mut self) {
        let spawned = std::mem::take(&mut self.queued);
        self.queued = std::mem::take(&mut self.resumed);
        self.queued.extend(spawned);
        self.in_flight.clear();
        self.cancelled.clear();
    }
}
