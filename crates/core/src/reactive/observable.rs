//! Mutable reactive value

use super::graph::SourceNode;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A mutable value whose tracked reads become dependencies
///
/// Writes mark every dependent stale; dependents recompute (computeds) or
/// re-run (reactions) later, never inside the write.
pub struct Observable<T> {
    inner: Rc<ObservableInner<T>>,
}

struct ObservableInner<T> {
    value: RefCell<T>,
    source: Rc<SourceNode>,
}

impl<T: 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(ObservableInner {
                value: RefCell::new(value),
                source: SourceNode::new(),
            }),
        }
    }

    /// Borrow the value, recording a dependency
    ///
    /// Writing to the same observable from inside `f` panics.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.source.track();
        self.with_untracked(f)
    }

    /// Borrow the value without recording a dependency
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Replace the value and mark dependents stale
    pub fn set(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
        self.inner.source.notify();
    }

    /// Mutate the value in place and mark dependents stale
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = f(&mut self.inner.value.borrow_mut());
        self.inner.source.notify();
        result
    }

    /// Number of live computations currently depending on this value
    pub fn subscriber_count(&self) -> usize {
        self.inner.source.subscriber_count()
    }
}

impl<T: Clone + 'static> Observable<T> {
    /// Clone the value, recording a dependency
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    pub fn get_untracked(&self) -> T {
        self.with_untracked(T::clone)
    }
}

impl<T: PartialEq + 'static> Observable<T> {
    /// Set only when the value differs; returns whether dependents were notified
    pub fn set_if_changed(&self, value: T) -> bool {
        if self.with_untracked(|current| *current == value) {
            return false;
        }
        self.set(value);
        true
    }
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Observable")
            .field(&self.inner.value.borrow())
            .finish()
    }
}

impl<T: Default + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let cell = Observable::new(1);
        assert_eq!(cell.get(), 1);

        cell.set(2);
        assert_eq!(cell.get(), 2);

        cell.update(|v| *v += 40);
        assert_eq!(cell.get_untracked(), 42);
    }

    #[test]
    fn test_set_if_changed_skips_equal_values() {
        let cell = Observable::new(String::from("a"));
        assert!(!cell.set_if_changed("a".to_string()));
        assert!(cell.set_if_changed("b".to_string()));
        assert_eq!(cell.get(), "b");
    }

    #[test]
    fn test_clones_share_state() {
        let a = Observable::new(vec![1]);
        let b = a.clone();
        b.update(|v| v.push(2));
        assert_eq!(a.get(), vec![1, 2]);
    }
}
