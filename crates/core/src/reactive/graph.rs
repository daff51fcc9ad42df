//! Dependency graph edges between sources and observers
//!
//! A `SourceNode` is anything that can be read in a tracked scope (an
//! observable or a computed). An `Observer` is anything that tracks reads (a
//! computed or a reaction). Sources hold observers weakly; observers hold
//! their sources strongly so that a dropped observer unsubscribes itself.

use super::runtime;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

pub(crate) struct SourceNode {
    subscribers: RefCell<Vec<Weak<Observer>>>,
}

impl SourceNode {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self {
            subscribers: RefCell::new(Vec::new()),
        })
    }

    /// Record a read by the currently running observer
    pub(crate) fn track(self: &Rc<Self>) {
        if let Some(observer) = runtime::current_observer() {
            observer.depend_on(self);
        }
    }

    /// Mark every subscriber stale
    pub(crate) fn notify(&self) {
        let subscribers: Vec<Rc<Observer>> = {
            let mut subscribers = self.subscribers.borrow_mut();
            subscribers.retain(|s| s.strong_count() > 0);
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };

        for subscriber in subscribers {
            subscriber.invalidate();
        }
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers
            .borrow()
            .iter()
            .filter(|s| s.strong_count() > 0)
            .count()
    }

    fn subscribe(&self, observer: &Rc<Observer>) {
        self.subscribers.borrow_mut().push(Rc::downgrade(observer));
    }

    fn unsubscribe(&self, observer: *const Observer) {
        self.subscribers
            .borrow_mut()
            .retain(|s| !std::ptr::eq(s.as_ptr(), observer));
    }
}

pub(crate) struct Observer {
    sources: RefCell<Vec<Rc<SourceNode>>>,
    stale: Cell<bool>,
    on_invalidate: Box<dyn Fn()>,
}

impl Observer {
    /// New observers start stale: nothing has been computed yet
    pub(crate) fn new(on_invalidate: impl Fn() + 'static) -> Rc<Self> {
        Rc::new(Self {
            sources: RefCell::new(Vec::new()),
            stale: Cell::new(true),
            on_invalidate: Box::new(on_invalidate),
        })
    }

    pub(crate) fn is_stale(&self) -> bool {
        self.stale.get()
    }

    /// Re-run `f`, replacing the previous dependency set with the reads it makes
    pub(crate) fn run<R>(self: &Rc<Self>, f: impl FnOnce() -> R) -> R {
        self.clear();
        // Cleared before running so a write made during `f` re-stales us
        self.stale.set(false);
        runtime::with_observer(self, f)
    }

    /// Drop every dependency edge
    pub(crate) fn clear(&self) {
        let sources = std::mem::take(&mut *self.sources.borrow_mut());
        for source in sources {
            source.unsubscribe(self);
        }
    }

    pub(crate) fn source_count(&self) -> usize {
        self.sources.borrow().len()
    }

    fn depend_on(self: &Rc<Self>, source: &Rc<SourceNode>) {
        let mut sources = self.sources.borrow_mut();
        if sources.iter().any(|s| Rc::ptr_eq(s, source)) {
            return;
        }
        sources.push(Rc::clone(source));
        source.subscribe(self);
    }

    fn invalidate(&self) {
        if self.stale.replace(true) {
            return;
        }
        (self.on_invalidate)();
    }
}

impl Drop for Observer {
    fn drop(&mut self) {
        self.clear();
    }
}
