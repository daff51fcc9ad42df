//! Side-effecting computations re-run on the job queue

use super::graph::Observer;
use super::runtime;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// An effect that re-runs after any of its tracked reads change
///
/// The first run happens synchronously on construction. Later runs are queued
/// and happen on the next [`flush`](super::flush), so any number of writes
/// made between two flushes produce a single re-run that sees the final state.
///
/// The handle is the disposer: [`dispose`](Self::dispose) (or dropping the
/// handle) unsubscribes from every dependency and cancels a queued run.
pub struct Reaction {
    inner: Rc<ReactionInner>,
}

struct ReactionInner {
    observer: Rc<Observer>,
    run: RefCell<Box<dyn FnMut()>>,
    scheduled: Cell<bool>,
    disposed: Cell<bool>,
    runs: Cell<u64>,
}

impl Reaction {
    /// Run `f` now and again whenever a value it read changes
    pub fn effect(f: impl FnMut() + 'static) -> Self {
        let inner = Rc::new_cyclic(|weak: &Weak<ReactionInner>| {
            let weak = weak.clone();
            ReactionInner {
                observer: Observer::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.schedule();
                    }
                }),
                run: RefCell::new(Box::new(f)),
                scheduled: Cell::new(false),
                disposed: Cell::new(false),
                runs: Cell::new(0),
            }
        });

        inner.execute();
        Self { inner }
    }

    /// Track `data`; call `effect(new, previous)` each time its value changes
    ///
    /// `effect` runs untracked, so only the reads made by `data` re-trigger
    /// the reaction. It is called once for the initial value with
    /// `previous == None`.
    pub fn new<T: PartialEq + 'static>(
        data: impl Fn() -> T + 'static,
        mut effect: impl FnMut(&T, Option<&T>) + 'static,
    ) -> Self {
        let mut previous: Option<T> = None;
        Self::effect(move || {
            let value = data();
            if previous.as_ref() == Some(&value) {
                return;
            }
            runtime::untracked(|| effect(&value, previous.as_ref()));
            previous = Some(value);
        })
    }

    /// Stop the reaction; safe to call any number of times
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        self.inner.observer.clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Number of times the effect has run
    pub fn run_count(&self) -> u64 {
        self.inner.runs.get()
    }

    /// Box the disposer as a node cleanup callback
    pub fn into_cleanup(self) -> Box<dyn FnOnce()> {
        Box::new(move || self.dispose())
    }
}

impl Drop for Reaction {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl ReactionInner {
    fn schedule(self: &Rc<Self>) {
        if self.disposed.get() || self.scheduled.replace(true) {
            return;
        }
        let inner = Rc::clone(self);
        runtime::queue_microtask(move || inner.execute());
    }

    fn execute(self: &Rc<Self>) {
        self.scheduled.set(false);
        if self.disposed.get() {
            return;
        }

        self.runs.set(self.runs.get() + 1);
        {
            let mut run = self.run.borrow_mut();
            let run: &mut dyn FnMut() = &mut **run;
            self.observer.run(run);
        }

        // Disposed from inside its own run: drop the edges it just recorded
        if self.disposed.get() {
            self.observer.clear();
        }
    }
}
