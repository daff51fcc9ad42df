//! Thread-local reactive runtime
//!
//! Holds the dependency-tracking context (a stack of running observers) and
//! the deferred job queue. Jobs are setup hooks and stale reactions; they run
//! only when the queue is flushed, never inside the write that scheduled them.

use super::graph::Observer;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::warn;

/// Upper bound on jobs run by a single flush before it gives up
///
/// Reaching it almost always means a reaction writes to something it reads.
const MAX_JOBS_PER_FLUSH: usize = 100_000;

type Job = Box<dyn FnOnce()>;

#[derive(Default)]
struct Runtime {
    /// `None` entries mark untracked scopes
    observers: RefCell<Vec<Option<Rc<Observer>>>>,
    queue: RefCell<VecDeque<Job>>,
    flushing: Cell<bool>,
}

thread_local! {
    static RUNTIME: Runtime = Runtime::default();
}

/// Observer currently collecting dependencies, if any
pub(crate) fn current_observer() -> Option<Rc<Observer>> {
    RUNTIME.with(|rt| rt.observers.borrow().last().cloned().flatten())
}

/// Pops the observer stack even when the scoped closure panics
struct ScopeGuard;

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        RUNTIME.with(|rt| {
            rt.observers.borrow_mut().pop();
        });
    }
}

fn scoped<R>(observer: Option<Rc<Observer>>, f: impl FnOnce() -> R) -> R {
    RUNTIME.with(|rt| rt.observers.borrow_mut().push(observer));
    let _guard = ScopeGuard;
    f()
}

/// Run `f` with `observer` recording every tracked read
pub(crate) fn with_observer<R>(observer: &Rc<Observer>, f: impl FnOnce() -> R) -> R {
    scoped(Some(Rc::clone(observer)), f)
}

/// Run `f` without recording dependencies for the enclosing computation
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    scoped(None, f)
}

/// Defer `job` until the next flush
pub fn queue_microtask(job: impl FnOnce() + 'static) {
    RUNTIME.with(|rt| rt.queue.borrow_mut().push_back(Box::new(job)));
}

/// Number of jobs waiting for the next flush
pub fn pending() -> usize {
    RUNTIME.with(|rt| rt.queue.borrow().len())
}

struct FlushGuard;

impl Drop for FlushGuard {
    fn drop(&mut self) {
        RUNTIME.with(|rt| rt.flushing.set(false));
    }
}

/// Run queued jobs until the queue is empty
///
/// Jobs queued while flushing run in the same flush. A nested call (from
/// inside a job) returns immediately; the outer flush picks up its work.
/// Returns the number of jobs run.
pub fn flush() -> usize {
    let already_flushing = RUNTIME.with(|rt| rt.flushing.replace(true));
    if already_flushing {
        return 0;
    }
    let _guard = FlushGuard;

    let mut ran = 0;
    loop {
        let job = RUNTIME.with(|rt| rt.queue.borrow_mut().pop_front());
        let Some(job) = job else { break };

        job();
        ran += 1;

        if ran >= MAX_JOBS_PER_FLUSH {
            warn!(
                "Reactive flush stopped after {} jobs ({} still queued); a reaction may be feeding itself",
                ran,
                pending()
            );
            break;
        }
    }
    ran
}

/// Yield to the executor once, then flush
///
/// This is the checkpoint between one synchronous batch of mutations and the
/// reactions it made stale.
pub async fn tick() -> usize {
    tokio::task::yield_now().await;
    flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_runs_jobs_in_fifo_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let log = Rc::clone(&log);
            queue_microtask(move || log.borrow_mut().push(i));
        }

        assert_eq!(pending(), 3);
        assert_eq!(flush(), 3);
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert_eq!(pending(), 0);
    }

    #[test]
    fn test_jobs_queued_during_flush_run_in_same_flush() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let inner_log = Rc::clone(&log);
        queue_microtask(move || {
            inner_log.borrow_mut().push("outer");
            let nested_log = Rc::clone(&inner_log);
            queue_microtask(move || nested_log.borrow_mut().push("nested"));
            // Nested flushes are no-ops
            assert_eq!(flush(), 0);
        });

        assert_eq!(flush(), 2);
        assert_eq!(*log.borrow(), vec!["outer", "nested"]);
    }

    #[test]
    fn test_untracked_hides_current_observer() {
        let observer = Observer::new(|| {});
        with_observer(&observer, || {
            assert!(current_observer().is_some());
            untracked(|| assert!(current_observer().is_none()));
            assert!(current_observer().is_some());
        });
        assert!(current_observer().is_none());
    }

    #[tokio::test]
    async fn test_tick_flushes_after_yield() {
        let hit = Rc::new(Cell::new(false));
        let flag = Rc::clone(&hit);
        queue_microtask(move || flag.set(true));

        assert!(!hit.get());
        assert_eq!(tick().await, 1);
        assert!(hit.get());
    }
}
