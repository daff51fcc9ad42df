//! File and directory nodes of the mirrored tree
//!
//! A node carries its reactive filesystem metadata and, for directories, a
//! reactive list of children. Each node goes through a small lifecycle:
//!
//! ```text
//! Created ──schedule_setup──▶ SetupPending ──(flush)──▶ Active ──destroy──▶ Destroyed
//!    └──────────────────────────────destroy──────────────────────────────────▲
//! ```
//!
//! Destruction can overtake a pending setup. The hook still runs when the
//! queue is flushed, and whatever cleanup it returns is invoked on the spot.

use crate::context::{FileContext, NodeType};
use crate::reactive::{self, Observable};
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::rc::Rc;
use std::time::SystemTime;
use tracing::{debug, error};

/// Teardown returned by a setup hook, owned by its node
pub type Cleanup = Box<dyn FnOnce()>;

/// Caller-supplied hook invoked once per created node
pub type SetupHook = Rc<dyn Fn(&Node) -> Option<Cleanup>>;

/// Filesystem metadata reported for a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stat {
    /// Size in bytes
    pub len: u64,
    /// Whether the entry was a directory when stat'ed
    pub is_dir: bool,
    /// Last modification time, where the platform reports one
    pub modified: Option<SystemTime>,
    /// Read-only permission flag
    pub readonly: bool,
}

impl Stat {
    /// Stat `path`, or `None` if it cannot be observed
    pub fn probe(path: &Path) -> Option<Self> {
        std::fs::metadata(path).ok().map(|m| Self::from(&m))
    }
}

impl From<&std::fs::Metadata> for Stat {
    fn from(metadata: &std::fs::Metadata) -> Self {
        Self {
            len: metadata.len(),
            is_dir: metadata.is_dir(),
            modified: metadata.modified().ok(),
            readonly: metadata.permissions().readonly(),
        }
    }
}

/// Observable lifecycle phase of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    SetupPending,
    Active,
    Destroyed,
}

enum State {
    Created,
    SetupPending,
    Active(Option<Cleanup>),
    Destroyed,
}

impl State {
    fn phase(&self) -> Lifecycle {
        match self {
            State::Created => Lifecycle::Created,
            State::SetupPending => Lifecycle::SetupPending,
            State::Active(_) => Lifecycle::Active,
            State::Destroyed => Lifecycle::Destroyed,
        }
    }
}

enum NodeKind {
    File,
    Directory { children: Observable<Vec<Node>> },
}

struct NodeInner {
    id: String,
    context: FileContext,
    kind: NodeKind,
    metadata: Observable<Option<Stat>>,
    state: RefCell<State>,
}

/// Shared handle to a tree node
///
/// Cloning is cheap and yields a handle to the same node. Outside this crate
/// the handle is read-only: the mutation engine in [`crate::tree`] is the only
/// writer of metadata and children.
#[derive(Clone)]
pub struct Node {
    inner: Rc<NodeInner>,
}

impl Node {
    pub fn file(id: impl Into<String>, context: FileContext, stat: Option<Stat>) -> Self {
        Self::build(id.into(), context, NodeKind::File, stat)
    }

    pub fn directory(id: impl Into<String>, context: FileContext, stat: Option<Stat>) -> Self {
        let children = Observable::new(Vec::new());
        Self::build(id.into(), context, NodeKind::Directory { children }, stat)
    }

    fn build(id: String, context: FileContext, kind: NodeKind, stat: Option<Stat>) -> Self {
        Self {
            inner: Rc::new(NodeInner {
                id,
                context,
                kind,
                metadata: Observable::new(stat),
                state: RefCell::new(State::Created),
            }),
        }
    }

    /// Path segment naming this node inside its parent
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn context(&self) -> &FileContext {
        &self.inner.context
    }

    pub fn node_type(&self) -> NodeType {
        match self.inner.kind {
            NodeKind::File => NodeType::File,
            NodeKind::Directory { .. } => NodeType::Directory,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.node_type() == NodeType::Directory
    }

    /// Current metadata (tracked); `None` once destroyed
    pub fn metadata(&self) -> Option<Stat> {
        self.inner.metadata.get()
    }

    pub fn metadata_untracked(&self) -> Option<Stat> {
        self.inner.metadata.get_untracked()
    }

    pub(crate) fn set_metadata(&self, stat: Option<Stat>) {
        self.inner.metadata.set(stat);
    }

    /// Borrow the children (tracked); files have none
    pub fn with_children<R>(&self, f: impl FnOnce(&[Node]) -> R) -> R {
        match &self.inner.kind {
            NodeKind::File => f(&[]),
            NodeKind::Directory { children } => children.with(|c| f(c)),
        }
    }

    /// Snapshot of the children (tracked), in insertion order
    pub fn children(&self) -> Vec<Node> {
        self.with_children(<[Node]>::to_vec)
    }

    /// Child with the given id (tracked)
    pub fn child(&self, id: &str) -> Option<Node> {
        self.with_children(|children| children.iter().find(|c| c.id() == id).cloned())
    }

    pub(crate) fn child_untracked(&self, id: &str) -> Option<Node> {
        self.children_cell()?
            .with_untracked(|children| children.iter().find(|c| c.id() == id).cloned())
    }

    pub(crate) fn children_cell(&self) -> Option<&Observable<Vec<Node>>> {
        match &self.inner.kind {
            NodeKind::File => None,
            NodeKind::Directory { children } => Some(children),
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.inner.state.borrow().phase()
    }

    pub fn is_destroyed(&self) -> bool {
        self.lifecycle() == Lifecycle::Destroyed
    }

    /// Whether both handles refer to the same node
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Queue `hook` to run once for this node on the next flush
    ///
    /// Without a hook the node becomes active immediately. Calling this on a
    /// node that already left `Created` does nothing.
    pub fn schedule_setup(&self, hook: Option<&SetupHook>) {
        let mut state = self.inner.state.borrow_mut();
        if !matches!(*state, State::Created) {
            return;
        }

        let Some(hook) = hook else {
            *state = State::Active(None);
            return;
        };

        *state = State::SetupPending;
        drop(state);

        let node = self.clone();
        let hook = Rc::clone(hook);
        reactive::queue_microtask(move || node.complete_setup(&hook));
    }

    fn complete_setup(&self, hook: &SetupHook) {
        let cleanup = reactive::untracked(|| hook(self));

        match self.lifecycle() {
            Lifecycle::SetupPending => {
                *self.inner.state.borrow_mut() = State::Active(cleanup);
            }
            Lifecycle::Destroyed => {
                if let Some(cleanup) = cleanup {
                    debug!(
                        "Setup finished after {} was destroyed, running its cleanup now",
                        self.inner.context.fullpath.display()
                    );
                    run_cleanup(self, cleanup);
                }
            }
            Lifecycle::Created | Lifecycle::Active => {}
        }
    }

    /// Destroy this node and, for directories, every descendant
    ///
    /// Children are destroyed before their parent, each cleanup runs exactly
    /// once, and metadata is cleared. Terminal and idempotent. A panicking
    /// cleanup is logged and does not stop the rest of the cascade.
    pub fn destroy(&self) {
        let previous = std::mem::replace(&mut *self.inner.state.borrow_mut(), State::Destroyed);
        if matches!(previous, State::Destroyed) {
            return;
        }

        if let Some(children) = self.children_cell() {
            let detached = children.update(std::mem::take);
            for child in detached {
                child.destroy();
            }
        }

        if let State::Active(Some(cleanup)) = previous {
            run_cleanup(self, cleanup);
        }

        self.inner.metadata.set(None);
        debug!("Destroyed node {}", self.inner.context.fullpath.display());
    }
}

fn run_cleanup(node: &Node, cleanup: Cleanup) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(cleanup)) {
        error!(
            "Cleanup for {} panicked: {}",
            node.context().fullpath.display(),
            panic_message(panic.as_ref())
        );
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic payload>"
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.inner.id)
            .field("type", &self.node_type())
            .field("fullpath", &self.inner.context.fullpath)
            .field("lifecycle", &self.lifecycle())
            .finish()
    }
}
