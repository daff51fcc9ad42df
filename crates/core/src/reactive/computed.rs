//! Memoized derived value

use super::graph::{Observer, SourceNode};
use std::cell::RefCell;
use std::rc::Rc;

/// A lazily recomputed function of observables and other computeds
///
/// The value is cached until one of the reads made by the last computation
/// changes, and is only recomputed when read again after that.
pub struct Computed<T> {
    inner: Rc<ComputedInner<T>>,
}

struct ComputedInner<T> {
    compute: Box<dyn Fn() -> T>,
    value: RefCell<Option<T>>,
    observer: Rc<Observer>,
    source: Rc<SourceNode>,
}

impl<T: 'static> Computed<T> {
    pub fn new(compute: impl Fn() -> T + 'static) -> Self {
        let source = SourceNode::new();
        let downstream = Rc::clone(&source);
        let observer = Observer::new(move || downstream.notify());

        Self {
            inner: Rc::new(ComputedInner {
                compute: Box::new(compute),
                value: RefCell::new(None),
                observer,
                source,
            }),
        }
    }

    /// Borrow the current value, recomputing first if stale
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.source.track();
        self.refresh();

        let value = self.inner.value.borrow();
        match value.as_ref() {
            Some(value) => f(value),
            None => unreachable!("computed value is populated by refresh"),
        }
    }

    /// Whether the next read will recompute
    pub fn is_stale(&self) -> bool {
        self.inner.observer.is_stale()
    }

    fn refresh(&self) {
        let inner = &self.inner;
        if !inner.observer.is_stale() && inner.value.borrow().is_some() {
            return;
        }

        let next = inner.observer.run(|| (inner.compute)());
        *inner.value.borrow_mut() = Some(next);
    }
}

impl<T: Clone + 'static> Computed<T> {
    pub fn get(&self) -> T {
        self.with(T::clone)
    }
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}
