#![forbid(unsafe_code)]

//! Execution contexts for binding delivery.
//!
//! Every binding delivers its values through an [`ExecutionContext`]:
//!
//! - [`ExecutionContext::Main`] is the UI context. Delivery runs inline when
//!   the calling thread has been marked as the UI thread, otherwise the task
//!   is queued on the [`MainQueue`] until the host drains it.
//! - [`ExecutionContext::Immediate`] runs on the calling thread, undispatched.
//! - [`ExecutionContext::Executor`] hands the task to a custom [`Executor`].
//!
//! # Invariants
//!
//! 1. Tasks queued on the main queue run in FIFO order.
//! 2. `MainQueue::drain()` never holds the queue lock while running a task,
//!    so tasks may enqueue further tasks.

use std::cell::Cell;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::sync::lock;

/// A unit of work handed to an execution context.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Something that can run tasks, typically on another thread.
pub trait Executor: Send + Sync {
    /// Run `task` at the executor's convenience.
    fn execute(&self, task: Task);
}

/// Where a binding handler runs.
#[derive(Clone, Default)]
pub enum ExecutionContext {
    /// The UI context (default).
    #[default]
    Main,
    /// The calling context, without any redispatch.
    Immediate,
    /// A caller-provided executor.
    Executor(Arc<dyn Executor>),
}

impl ExecutionContext {
    /// Wrap an executor into a context.
    pub fn executor(executor: impl Executor + 'static) -> Self {
        Self::Executor(Arc::new(executor))
    }

    /// Run `task` on this context.
    pub fn dispatch(&self, task: impl FnOnce() + Send + 'static) {
        match self {
            Self::Immediate => task(),
            Self::Main => MainQueue::dispatch(Box::new(task)),
            Self::Executor(executor) => executor.execute(Box::new(task)),
        }
    }

    /// Whether this context runs tasks synchronously on the current thread.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        match self {
            Self::Immediate => true,
            Self::Main => MainQueue::is_current_thread(),
            Self::Executor(_) => false,
        }
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => f.write_str("Main"),
            Self::Immediate => f.write_str("Immediate"),
            Self::Executor(_) => f.write_str("Executor(..)"),
        }
    }
}

thread_local! {
    static IS_MAIN_THREAD: Cell<bool> = const { Cell::new(false) };
}

static MAIN_QUEUE: Mutex<VecDeque<Task>> = Mutex::new(VecDeque::new());

/// The process-wide UI task queue.
///
/// The host event loop marks its thread with [`MainQueue::mark_current_thread`]
/// once, then calls [`MainQueue::drain`] every iteration to run tasks that
/// were dispatched from other threads (timers, background fetches).
#[derive(Debug, Clone, Copy)]
pub struct MainQueue;

impl MainQueue {
    /// Mark the calling thread as the UI thread.
    ///
    /// Main-context deliveries issued from this thread run inline.
    pub fn mark_current_thread() {
        IS_MAIN_THREAD.with(|flag| flag.set(true));
    }

    /// Remove the UI-thread mark from the calling thread.
    pub fn unmark_current_thread() {
        IS_MAIN_THREAD.with(|flag| flag.set(false));
    }

    /// Whether the calling thread is the UI thread.
    #[must_use]
    pub fn is_current_thread() -> bool {
        IS_MAIN_THREAD.with(Cell::get)
    }

    /// Run `task` inline on the UI thread, or queue it for the next drain.
    pub fn dispatch(task: Task) {
        if Self::is_current_thread() {
            task();
        } else {
            lock(&MAIN_QUEUE).push_back(task);
        }
    }

    /// Number of queued tasks.
    #[must_use]
    pub fn pending() -> usize {
        lock(&MAIN_QUEUE).len()
    }

    /// Run queued tasks until the queue is empty. Returns how many ran.
    pub fn drain() -> usize {
        let mut ran = 0;
        loop {
            let next = lock(&MAIN_QUEUE).pop_front();
            match next {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }
}

/// Serializes tests that queue onto or drain the process-wide main queue.
#[cfg(test)]
pub(crate) fn main_queue_guard() -> std::sync::MutexGuard<'static, ()> {
    static GUARD: Mutex<()> = Mutex::new(());
    lock(&GUARD)
}
