//! Cooperative single-threaded task queue.
//!
//! Replaces self-rearming frame callbacks and free-running intervals with
//! tasks the session owns. A task keeps firing until it is cancelled, and
//! cancelling also drops any of its firings that are queued but not yet run.
//!
//! Usage:
//!   let mut sched = Scheduler::new();
//!   let clock = sched.every(1.0, TaskKind::Clock);
//!   sched.advance(dt);
//!   while let Some(firing) = sched.pop() { /* dispatch */ }

use std::collections::VecDeque;
use super::time::IntervalTimer;

/// Handle to a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u32);

/// What a firing asks the owner to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// One countdown step (3, 2, 1, go, then run).
    Countdown,
    /// One second off the session clock.
    Clock,
    /// One invocation of the frame loop driver.
    FrameLoop,
}

#[derive(Debug, Clone)]
enum Cadence {
    Interval(IntervalTimer),
    EveryFrame,
}

#[derive(Debug, Clone)]
struct Task {
    id: TaskId,
    kind: TaskKind,
    cadence: Cadence,
}

/// A single due invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Firing {
    pub id: TaskId,
    pub kind: TaskKind,
    /// Seconds covered by this firing: the period for intervals, the frame
    /// delta for per-frame tasks.
    pub dt: f32,
}

/// Ordered set of live tasks plus the queue of due firings.
#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: Vec<Task>,
    ready: VecDeque<Firing>,
    next_id: u32,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, kind: TaskKind, cadence: Cadence) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(Task { id, kind, cadence });
        id
    }

    /// Fire `kind` once per `period` seconds of advanced time.
    pub fn every(&mut self, period: f32, kind: TaskKind) -> TaskId {
        self.insert(kind, Cadence::Interval(IntervalTimer::new(period)))
    }

    /// Fire `kind` once per `advance` call.
    pub fn every_frame(&mut self, kind: TaskKind) -> TaskId {
        self.insert(kind, Cadence::EveryFrame)
    }

    /// Cancel one task. Returns false if it was not scheduled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.ready.retain(|f| f.id != id);
        self.tasks.len() != before
    }

    /// Cancel every task and drop every queued firing.
    pub fn cancel_all(&mut self) {
        self.tasks.clear();
        self.ready.clear();
    }

    #[cfg(test)]
    pub(crate) fn is_scheduled(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    /// Number of live tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Number of firings queued but not yet popped.
    pub fn pending(&self) -> usize {
        self.ready.len()
    }

    /// Advance time by one display frame and queue what became due.
    ///
    /// Interval firings are queued before per-frame firings, each group in
    /// registration order. Tasks added while the queue drains first fire on
    /// the next advance.
    pub fn advance(&mut self, dt: f32) {
        for task in &mut self.tasks {
            if let Cadence::Interval(timer) = &mut task.cadence {
                let period = timer.period();
                for _ in 0..timer.accumulate(dt) {
                    self.ready.push_back(Firing { id: task.id, kind: task.kind, dt: period });
                }
            }
        }
        for task in &self.tasks {
            if let Cadence::EveryFrame = task.cadence {
                self.ready.push_back(Firing { id: task.id, kind: task.kind, dt });
            }
        }
    }

    /// Next due firing of a still-live task.
    pub fn pop(&mut self) -> Option<Firing> {
        self.ready.pop_front()
    }
}
