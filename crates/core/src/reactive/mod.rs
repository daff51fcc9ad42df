//! Single-threaded reactive substrate
//!
//! Three primitives:
//! - [`Observable`]: mutable value; tracked reads, invalidating writes
//! - [`Computed`]: memoized derived value, recomputed lazily after invalidation
//! - [`Reaction`]: side effect re-run on the job queue, with explicit disposal
//!
//! Dependency tracking uses a thread-local stack of running observers. Writes
//! only mark dependents stale; stale reactions are queued and run by
//! [`flush`], so a reaction observes the final state of a synchronous batch.

mod computed;
mod graph;
mod observable;
mod reaction;
mod runtime;

pub use computed::Computed;
pub use observable::Observable;
pub use reaction::Reaction;
pub use runtime::{flush, pending, queue_microtask, tick, untracked};
