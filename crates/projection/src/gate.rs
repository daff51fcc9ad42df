//! Debounced, change-detecting write gate
//!
//! One gate serves one artifact path. Submissions inside the debounce
//! interval collapse into a single trailing write of the latest content;
//! content identical to what was last written successfully is dropped.
//! After [`WriteGate::dispose`] nothing is written, including a write whose
//! timer is already running.
//!
//! A failed write is not retried. The error is kept until the next
//! successful write and handed to the error callback, if one is set.
//!
//! A non-zero interval arms timers with `tokio::task::spawn_local`, so the
//! gate must then be driven from inside a `LocalSet`. An interval of zero
//! writes synchronously and needs no runtime.

use crate::writer::ArtifactWriter;
use crate::ProjectionError;
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Called with every failed write
pub type WriteErrorCallback = Rc<dyn Fn(&ProjectionError)>;

#[derive(Clone)]
pub struct WriteGate {
    inner: Rc<GateInner>,
}

struct GateInner {
    path: PathBuf,
    interval: Duration,
    writer: Rc<dyn ArtifactWriter>,
    last_written: RefCell<Option<String>>,
    pending: RefCell<Option<String>>,
    generation: Cell<u64>,
    disposed: Cell<bool>,
    writes: Cell<u64>,
    last_error: RefCell<Option<Rc<ProjectionError>>>,
    on_error: Option<WriteErrorCallback>,
}

impl WriteGate {
    pub fn new(path: PathBuf, interval: Duration, writer: Rc<dyn ArtifactWriter>) -> Self {
        Self::with_error_callback(path, interval, writer, None)
    }

    pub fn with_error_callback(
        path: PathBuf,
        interval: Duration,
        writer: Rc<dyn ArtifactWriter>,
        on_error: Option<WriteErrorCallback>,
    ) -> Self {
        Self {
            inner: Rc::new(GateInner {
                path,
                interval,
                writer,
                last_written: RefCell::new(None),
                pending: RefCell::new(None),
                generation: Cell::new(0),
                disposed: Cell::new(false),
                writes: Cell::new(0),
                last_error: RefCell::new(None),
                on_error,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Queue `content` for writing
    pub fn submit(&self, content: String) {
        let inner = &self.inner;
        if inner.disposed.get() {
            return;
        }

        if inner.interval.is_zero() {
            inner.commit(content);
            return;
        }

        *inner.pending.borrow_mut() = Some(content);
        let generation = inner.generation.get() + 1;
        inner.generation.set(generation);

        let timer = Rc::clone(inner);
        tokio::task::spawn_local(async move {
            tokio::time::sleep(timer.interval).await;
            // Superseded by a later submission, or torn down meanwhile
            if timer.generation.get() != generation || timer.disposed.get() {
                return;
            }
            let content = timer.pending.borrow_mut().take();
            if let Some(content) = content {
                timer.commit(content);
            }
        });
    }

    /// Whether a debounced write is waiting for its timer
    pub fn is_pending(&self) -> bool {
        self.inner.pending.borrow().is_some()
    }

    /// Stop writing; idempotent
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        if self.inner.pending.borrow_mut().take().is_some() {
            debug!("Dropped pending write to {}", self.inner.path.display());
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Number of writes that reached the writer and succeeded
    pub fn write_count(&self) -> u64 {
        self.inner.writes.get()
    }

    /// Error of the most recent write, if it failed
    pub fn last_error(&self) -> Option<Rc<ProjectionError>> {
        self.inner.last_error.borrow().clone()
    }
}

impl GateInner {
    fn commit(&self, content: String) {
        if self.last_written.borrow().as_deref() == Some(content.as_str()) {
            debug!("{} is up to date", self.path.display());
            return;
        }

        match self.writer.write(&self.path, &content) {
            Ok(()) => {
                info!("Wrote {}", self.path.display());
                self.writes.set(self.writes.get() + 1);
                *self.last_written.borrow_mut() = Some(content);
                self.last_error.borrow_mut().take();
            }
            Err(e) => {
                warn!("{}", e);
                if let Some(ref on_error) = self.on_error {
                    on_error(&e);
                }
                *self.last_error.borrow_mut() = Some(Rc::new(e));
            }
        }
    }
}
