//! Cooperative timer queue used by the sequence controller.
//!
//! [`TimeoutScheduler`] runs on the browser event loop through
//! `gloo_timers` timeouts and `wasm_bindgen_futures::spawn_local`.
//! [`ManualScheduler`] is a simulated clock that only moves when told to,
//! which keeps sequencing fully deterministic outside the browser.

use futures::executor::LocalPool;
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;
use gloo_timers::callback::Timeout;
use log::warn;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// Handle of a scheduled callback, unique per scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

pub type Task = Box<dyn FnOnce()>;

/// Single-threaded timer queue. Callbacks run serially and never while
/// another callback is on the stack.
pub trait Scheduler {
    /// Run `task` once after `delay_ms`. A zero delay still defers the task
    /// to a later turn of the queue.
    fn schedule(&self, delay_ms: u32, task: Task) -> TimerId;

    /// Drop a pending task. Unknown or already-fired ids are ignored.
    fn cancel(&self, id: TimerId);

    /// Drive a future to completion on the same thread.
    fn spawn(&self, future: LocalBoxFuture<'static, ()>);
}

// ──────────────────────────────────────────────────────────────────────────────
// Browser event loop

/// Scheduler backed by `setTimeout`. Dropping it cancels everything pending.
#[derive(Default)]
pub struct TimeoutScheduler {
    next_id: Cell<u64>,
    pending: RefCell<HashMap<TimerId, Timeout>>,
    fired: Rc<RefCell<Vec<TimerId>>>,
}

impl TimeoutScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget timeouts that already ran. A `Timeout` cannot be dropped from
    /// inside its own callback, so fired entries are swept on the next call.
    fn sweep_fired(&self) {
        let fired: Vec<TimerId> = self.fired.borrow_mut().drain(..).collect();
        if fired.is_empty() {
            return;
        }
        let mut pending = self.pending.borrow_mut();
        for id in fired {
            pending.remove(&id);
        }
    }
}

impl Scheduler for TimeoutScheduler {
    fn schedule(&self, delay_ms: u32, task: Task) -> TimerId {
        self.sweep_fired();
        let id = TimerId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let fired = Rc::clone(&self.fired);
        let handle = Timeout::new(delay_ms, move || {
            fired.borrow_mut().push(id);
            task();
        });
        self.pending.borrow_mut().insert(id, handle);
        id
    }

    fn cancel(&self, id: TimerId) {
        self.sweep_fired();
        // Dropping the handle clears the browser timeout.
        self.pending.borrow_mut().remove(&id);
    }

    fn spawn(&self, future: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(future);
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Simulated clock

struct Entry {
    key: (u64, u64),
    task: Task,
}

#[derive(Default)]
struct Queue {
    now_ms: u64,
    next_seq: u64,
    // (due_ms, seq) -> id keeps insertion order for equal deadlines.
    order: BTreeMap<(u64, u64), TimerId>,
    entries: HashMap<TimerId, Entry>,
}

struct ManualInner {
    queue: RefCell<Queue>,
    pool: RefCell<LocalPool>,
}

/// Deterministic scheduler whose clock advances only through
/// [`ManualScheduler::advance`]. Cloning yields another handle to the same
/// queue.
#[derive(Clone)]
pub struct ManualScheduler {
    inner: Rc<ManualInner>,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ManualInner {
                queue: RefCell::new(Queue::default()),
                pool: RefCell::new(LocalPool::new()),
            }),
        }
    }

    /// Simulated milliseconds elapsed since construction.
    pub fn now_ms(&self) -> u64 {
        self.inner.queue.borrow().now_ms
    }

    /// Number of tasks waiting on the clock.
    pub fn pending(&self) -> usize {
        self.inner.queue.borrow().entries.len()
    }

    /// Deadline of the earliest pending task.
    pub fn next_due_ms(&self) -> Option<u64> {
        self.inner
            .queue
            .borrow()
            .order
            .keys()
            .next()
            .map(|&(due, _)| due)
    }

    /// Poll spawned futures until none can make progress.
    pub fn run_until_stalled(&self) {
        self.inner.pool.borrow_mut().run_until_stalled();
    }

    /// Move the clock forward by `ms`, running every task that falls due in
    /// deadline order, including tasks scheduled by tasks along the way.
    /// Returns the number of tasks run.
    pub fn advance(&self, ms: u64) -> usize {
        let target = self.now_ms() + ms;
        let mut ran = 0;
        self.run_until_stalled();
        while let Some(task) = self.pop_due(target) {
            task();
            ran += 1;
            self.run_until_stalled();
        }
        self.inner.queue.borrow_mut().now_ms = target;
        ran
    }

    /// Advance straight to the next deadline and run what is due there.
    pub fn advance_to_next(&self) -> Option<u64> {
        let due = self.next_due_ms()?;
        let now = self.now_ms();
        self.advance(due.saturating_sub(now));
        Some(due)
    }

    fn pop_due(&self, target: u64) -> Option<Task> {
        let mut queue = self.inner.queue.borrow_mut();
        let (&key, &id) = queue.order.iter().next()?;
        if key.0 > target {
            return None;
        }
        queue.order.remove(&key);
        queue.now_ms = key.0;
        queue.entries.remove(&id).map(|entry| entry.task)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay_ms: u32, task: Task) -> TimerId {
        let mut queue = self.inner.queue.borrow_mut();
        let seq = queue.next_seq;
        queue.next_seq += 1;
        let id = TimerId(seq);
        let key = (queue.now_ms + u64::from(delay_ms), seq);
        queue.order.insert(key, id);
        queue.entries.insert(id, Entry { key, task });
        id
    }

    fn cancel(&self, id: TimerId) {
        let mut queue = self.inner.queue.borrow_mut();
        if let Some(entry) = queue.entries.remove(&id) {
            queue.order.remove(&entry.key);
        }
    }

    fn spawn(&self, future: LocalBoxFuture<'static, ()>) {
        let spawner = self.inner.pool.borrow().spawner();
        if let Err(e) = spawner.spawn_local(future) {
            warn!("Failed to spawn task on manual scheduler: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Task) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let make = {
            let log = Rc::clone(&log);
            move |name: &'static str| -> Task {
                let log = Rc::clone(&log);
                Box::new(move || log.borrow_mut().push(name))
            }
        };
        (log, make)
    }

    #[test]
    fn zero_delay_waits_for_advance() {
        let sched = ManualScheduler::new();
        let (log, task) = recorder();
        sched.schedule(0, task("a"));
        assert!(log.borrow().is_empty());
        assert_eq!(sched.advance(0), 1);
        assert_eq!(*log.borrow(), vec!["a"]);
    }

    #[test]
    fn runs_in_deadline_then_insertion_order() {
        let sched = ManualScheduler::new();
        let (log, task) = recorder();
        sched.schedule(200, task("late"));
        sched.schedule(100, task("first"));
        sched.schedule(100, task("second"));
        sched.advance(150);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
        assert_eq!(sched.now_ms(), 150);
        sched.advance(50);
        assert_eq!(*log.borrow(), vec!["first", "second", "late"]);
    }

    #[test]
    fn cancelled_tasks_never_run() {
        let sched = ManualScheduler::new();
        let (log, task) = recorder();
        let id = sched.schedule(10, task("gone"));
        sched.schedule(20, task("kept"));
        sched.cancel(id);
        sched.cancel(id);
        sched.advance(1_000);
        assert_eq!(*log.borrow(), vec!["kept"]);
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn nested_schedule_is_relative_to_firing_time() {
        let sched = ManualScheduler::new();
        let hit_at = Rc::new(Cell::new(0u64));
        {
            let inner_sched = sched.clone();
            let hit_at = Rc::clone(&hit_at);
            sched.schedule(
                100,
                Box::new(move || {
                    let clock = inner_sched.clone();
                    inner_sched.schedule(50, Box::new(move || hit_at.set(clock.now_ms())));
                }),
            );
        }
        sched.advance(1_000);
        assert_eq!(hit_at.get(), 150);
        assert_eq!(sched.now_ms(), 1_000);
    }

    #[test]
    fn spawned_futures_run_on_advance() {
        let sched = ManualScheduler::new();
        let done = Rc::new(Cell::new(false));
        let flag = Rc::clone(&done);
        sched.spawn(Box::pin(async move { flag.set(true) }));
        sched.advance(0);
        assert!(done.get());
    }
}
