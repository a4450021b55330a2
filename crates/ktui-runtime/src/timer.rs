#![forbid(unsafe_code)]

//! Timer scheduling for time-based operators.
//!
//! [`Scheduler`] is the seam between `debounce`/`throttle` and a clock:
//!
//! - [`TimerThread`] runs a background thread over a deadline heap. It is the
//!   default scheduler ([`TimerThread::shared`]).
//! - [`ManualScheduler`] keeps a virtual clock that only moves when
//!   [`ManualScheduler::advance`] is called, which makes timing tests
//!   deterministic.
//!
//! # Invariants
//!
//! 1. A task whose [`TimerHandle`] was cancelled before its deadline never runs.
//! 2. Tasks with equal deadlines run in scheduling order.
//! 3. Neither scheduler holds its queue lock while running a task.

use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, OnceLock};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use web_time::Instant;

use crate::executor::Task;
use crate::sync::lock;

/// A clock plus a way to run a task after a delay.
pub trait Scheduler: Send + Sync {
    /// Current time on this scheduler's clock.
    fn now(&self) -> Instant;

    /// Run `task` once `delay` has elapsed on this scheduler's clock.
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle;
}

/// Cancellation handle for a scheduled task.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
}

impl TimerHandle {
    fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Prevent the task from running. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether [`cancel`](Self::cancel) was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

struct Pending<K> {
    due: K,
    seq: u64,
    task: Task,
    handle: TimerHandle,
}

impl<K: Ord> PartialEq for Pending<K> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == CmpOrdering::Equal
    }
}

impl<K: Ord> Eq for Pending<K> {}

impl<K: Ord> PartialOrd for Pending<K> {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord> Ord for Pending<K> {
    // Reversed so that `BinaryHeap` pops the earliest deadline first.
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

// ---------------------------------------------------------------------------
// TimerThread
// ---------------------------------------------------------------------------

struct TimerState {
    queue: BinaryHeap<Pending<Instant>>,
    next_seq: u64,
    shutdown: bool,
}

struct TimerShared {
    state: Mutex<TimerState>,
    wake: Condvar,
}

/// Background timer thread driving a deadline heap.
pub struct TimerThread {
    shared: Arc<TimerShared>,
    worker: Mutex<Option<JoinHandle<()>>>,
    worker_id: ThreadId,
}

impl TimerThread {
    /// Spawn a new timer thread.
    pub fn start() -> io::Result<Self> {
        let shared = Arc::new(TimerShared {
            state: Mutex::new(TimerState {
                queue: BinaryHeap::new(),
                next_seq: 0,
                shutdown: false,
            }),
            wake: Condvar::new(),
        });
        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("ktui-timer".into())
            .spawn(move || timer_loop(&worker_shared))?;
        let worker_id = worker.thread().id();
        Ok(Self {
            shared,
            worker: Mutex::new(Some(worker)),
            worker_id,
        })
    }

    /// The process-wide timer thread, started on first use.
    ///
    /// # Panics
    ///
    /// Panics if the operating system refuses to spawn the thread.
    pub fn shared() -> Arc<Self> {
        static SHARED: OnceLock<Arc<TimerThread>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| {
            Arc::new(Self::start().expect("failed to spawn ktui timer thread"))
        }))
    }

    /// Number of scheduled tasks that have not run yet (cancelled included).
    #[must_use]
    pub fn pending(&self) -> usize {
        lock(&self.shared.state).queue.len()
    }

    /// Stop the thread. Pending tasks are discarded.
    pub fn shutdown(&self) {
        {
            let mut state = lock(&self.shared.state);
            state.shutdown = true;
            state.queue.clear();
        }
        self.shared.wake.notify_all();
        if thread::current().id() == self.worker_id {
            return;
        }
        if let Some(worker) = lock(&self.worker).take() {
            let _ = worker.join();
        }
    }
}

impl Scheduler for TimerThread {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let handle = TimerHandle::new();
        {
            let mut state = lock(&self.shared.state);
            if state.shutdown {
                handle.cancel();
                return handle;
            }
            let seq = state.next_seq;
            state.next_seq += 1;
            state.queue.push(Pending {
                due: Instant::now() + delay,
                seq,
                task,
                handle: handle.clone(),
            });
        }
        self.shared.wake.notify_one();
        handle
    }
}

impl Drop for TimerThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for TimerThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerThread")
            .field("pending", &self.pending())
            .finish()
    }
}

fn timer_loop(shared: &TimerShared) {
    let mut state = lock(&shared.state);
    loop {
        if state.shutdown {
            return;
        }
        let now = Instant::now();
        let next_due = state.queue.peek().map(|p| p.due);
        match next_due {
            None => {
                state = shared
                    .wake
                    .wait(state)
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
            }
            Some(due) if due > now => {
                state = shared
                    .wake
                    .wait_timeout(state, due - now)
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .0;
            }
            Some(_) => {
                let Some(pending) = state.queue.pop() else {
                    continue;
                };
                drop(state);
                if pending.handle.is_cancelled() {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(seq = pending.seq, "skipping cancelled timer");
                } else {
                    (pending.task)();
                }
                state = lock(&shared.state);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ManualScheduler
// ---------------------------------------------------------------------------

struct ManualState {
    elapsed: Duration,
    queue: BinaryHeap<Pending<Duration>>,
    next_seq: u64,
}

/// Virtual-clock scheduler for deterministic tests.
///
/// Time stands still until [`advance`](Self::advance) moves it; tasks whose
/// deadline is reached run synchronously on the advancing thread.
pub struct ManualScheduler {
    origin: Instant,
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    /// A scheduler whose clock starts now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            state: Mutex::new(ManualState {
                elapsed: Duration::ZERO,
                queue: BinaryHeap::new(),
                next_seq: 0,
            }),
        }
    }

    /// Virtual time elapsed since creation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        lock(&self.state).elapsed
    }

    /// Number of tasks still waiting, excluding cancelled ones.
    #[must_use]
    pub fn pending(&self) -> usize {
        lock(&self.state)
            .queue
            .iter()
            .filter(|p| !p.handle.is_cancelled())
            .count()
    }

    /// Move the clock forward by `by`, running every task that falls due.
    ///
    /// Tasks scheduled by running tasks are honoured if they fall due within
    /// the same window. Returns how many tasks ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target = lock(&self.state).elapsed + by;
        let mut ran = 0;
        loop {
            let next = {
                let mut state = lock(&self.state);
                match state.queue.peek() {
                    Some(p) if p.due <= target => {
                        let pending = state.queue.pop();
                        if let Some(p) = &pending {
                            state.elapsed = state.elapsed.max(p.due);
                        }
                        pending
                    }
                    _ => {
                        state.elapsed = target;
                        None
                    }
                }
            };
            match next {
                Some(pending) if pending.handle.is_cancelled() => {}
                Some(pending) => {
                    (pending.task)();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let handle = TimerHandle::new();
        let mut state = lock(&self.state);
        let seq = state.next_seq;
        state.next_seq += 1;
        let due = state.elapsed + delay;
        state.queue.push(Pending {
            due,
            seq,
            task,
            handle: handle.clone(),
        });
        handle
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("elapsed", &self.elapsed())
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl Fn(u32) -> Task) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let l = Arc::clone(&log);
        let make = move |n: u32| -> Task {
            let l = Arc::clone(&l);
            Box::new(move || l.lock().unwrap().push(n))
        };
        (log, make)
    }

    #[test]
    fn manual_runs_due_tasks_in_deadline_order() {
        let sched = ManualScheduler::new();
        let (log, task) = recorder();
        sched.schedule(Duration::from_millis(30), task(3));
        sched.schedule(Duration::from_millis(10), task(1));
        sched.schedule(Duration::from_millis(20), task(2));

        assert_eq!(sched.advance(Duration::from_millis(15)), 1);
        assert_eq!(*log.lock().unwrap(), vec![1]);
        assert_eq!(sched.advance(Duration::from_millis(15)), 2);
        assert_eq!(*log.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(sched.elapsed(), Duration::from_millis(30));
    }

    #[test]
    fn manual_equal_deadlines_keep_schedule_order() {
        let sched = ManualScheduler::new();
        let (log, task) = recorder();
        for n in 0..4 {
            sched.schedule(Duration::from_millis(5), task(n));
        }
        sched.advance(Duration::from_millis(5));
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn manual_cancelled_task_never_runs() {
        let sched = ManualScheduler::new();
        let (log, task) = recorder();
        let handle = sched.schedule(Duration::from_millis(10), task(1));
        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());
        assert_eq!(sched.pending(), 0);
        assert_eq!(sched.advance(Duration::from_millis(50)), 0);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn manual_now_tracks_virtual_clock() {
        let sched = ManualScheduler::new();
        let start = sched.now();
        sched.advance(Duration::from_millis(250));
        assert_eq!(sched.now() - start, Duration::from_millis(250));
    }

    #[test]
    fn manual_task_may_schedule_within_window() {
        let sched = Arc::new(ManualScheduler::new());
        let (log, task) = recorder();
        let inner = task(2);
        let s = Arc::clone(&sched);
        let outer_log = Arc::clone(&log);
        sched.schedule(
            Duration::from_millis(10),
            Box::new(move || {
                outer_log.lock().unwrap().push(1);
                s.schedule(Duration::from_millis(10), inner);
            }),
        );
        assert_eq!(sched.advance(Duration::from_millis(25)), 2);
        assert_eq!(*log.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn timer_thread_fires_after_delay() {
        let timer = TimerThread::start().unwrap();
        let (tx, rx) = mpsc::channel();
        let started = Instant::now();
        timer.schedule(
            Duration::from_millis(20),
            Box::new(move || {
                let _ = tx.send(Instant::now());
            }),
        );
        let fired = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(fired - started >= Duration::from_millis(20));
    }

    #[test]
    fn timer_thread_skips_cancelled() {
        let timer = TimerThread::start().unwrap();
        let (tx, rx) = mpsc::channel::<u32>();
        let tx2 = tx.clone();
        let handle = timer.schedule(
            Duration::from_millis(10),
            Box::new(move || {
                let _ = tx.send(1);
            }),
        );
        handle.cancel();
        timer.schedule(
            Duration::from_millis(30),
            Box::new(move || {
                let _ = tx2.send(2);
            }),
        );
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 2);
    }

    #[test]
    fn timer_thread_shutdown_discards_pending() {
        let timer = TimerThread::start().unwrap();
        timer.schedule(Duration::from_secs(60), Box::new(|| {}));
        assert_eq!(timer.pending(), 1);
        timer.shutdown();
        assert_eq!(timer.pending(), 0);
        let late = timer.schedule(Duration::ZERO, Box::new(|| {}));
        assert!(late.is_cancelled());
    }
}
