//! Watch orchestration
//!
//! [`TreeWatcher`] owns one [`Watching`] per root: the root directory node
//! plus the service subscription feeding it. Notifications are queued on a
//! channel and applied to the tree on the caller's thread, since nodes and
//! the reactive runtime are thread-local. After every drained batch the
//! reactive queue is flushed so reactions see the settled tree.

use crate::event::{EventSink, FsEvent, FsEventKind, Notification};
use crate::ignore::IgnoreRules;
use crate::service::{NotifyService, Subscription, WatchService};
use crate::WatchError;
use autoexport_core::{
    flush, insert, remove, update, Cleanup, FileContext, Node, NodeType, SetupHook, Stat,
    TreeError,
};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, info, warn};

/// Called after each event has been applied to the tree
pub type EventCallback = Rc<dyn Fn(&FsEvent)>;

/// Called once per root when its initial scan has been applied
pub type ReadyCallback = Rc<dyn Fn(&Node)>;

/// Options for [`TreeWatcher::watch`]
#[derive(Clone, Default)]
pub struct WatchOptions {
    pub setup: Option<SetupHook>,
    pub ignore: IgnoreRules,
    pub on_event: Option<EventCallback>,
    pub on_ready: Option<ReadyCallback>,
}

impl WatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_setup(mut self, setup: impl Fn(&Node) -> Option<Cleanup> + 'static) -> Self {
        self.setup = Some(Rc::new(setup));
        self
    }

    pub fn with_ignore(mut self, ignore: IgnoreRules) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn on_event(mut self, f: impl Fn(&FsEvent) + 'static) -> Self {
        self.on_event = Some(Rc::new(f));
        self
    }

    pub fn on_ready(mut self, f: impl Fn(&Node) + 'static) -> Self {
        self.on_ready = Some(Rc::new(f));
        self
    }
}

impl fmt::Debug for WatchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchOptions")
            .field("setup", &self.setup.is_some())
            .field("ignore", &self.ignore)
            .field("on_event", &self.on_event.is_some())
            .field("on_ready", &self.on_ready.is_some())
            .finish()
    }
}

/// One watched root
pub struct Watching {
    path: PathBuf,
    root: Node,
    subscription: Option<Box<dyn Subscription>>,
    ready: bool,
}

impl Watching {
    /// Root path as given to [`TreeWatcher::watch`]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Whether the initial scan has been applied
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_closed(&self) -> bool {
        self.subscription.is_none()
    }

    fn close(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.close();
            self.root.destroy();
            info!("Stopped watching {}", self.path.display());
        }
    }
}

impl fmt::Debug for Watching {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watching")
            .field("path", &self.path)
            .field("ready", &self.ready)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Mirrors one or more directories as reactive node trees
pub struct TreeWatcher {
    watchings: Vec<Watching>,
    events: UnboundedReceiver<(usize, Notification)>,
    setup: Option<SetupHook>,
    on_event: Option<EventCallback>,
    on_ready: Option<ReadyCallback>,
}

impl TreeWatcher {
    /// Watch `roots` with the platform watcher
    pub fn watch<P: AsRef<Path>>(roots: &[P], options: WatchOptions) -> Result<Self, WatchError> {
        Self::with_service(roots, options, &NotifyService)
    }

    /// Watch `roots` with a caller-supplied service
    ///
    /// Every root must be an existing directory; this is checked for all of
    /// them before any subscription is made.
    pub fn with_service<P: AsRef<Path>>(
        roots: &[P],
        options: WatchOptions,
        service: &dyn WatchService,
    ) -> Result<Self, WatchError> {
        let mut stats = Vec::with_capacity(roots.len());
        for root in roots {
            let root = root.as_ref();
            let metadata = std::fs::metadata(root).map_err(|source| WatchError::Stat {
                path: root.to_path_buf(),
                source,
            })?;
            if !metadata.is_dir() {
                return Err(WatchError::NotADirectory(root.to_path_buf()));
            }
            stats.push(Stat::from(&metadata));
        }

        let (tx, events) = mpsc::unbounded_channel();
        let mut watcher = Self {
            watchings: Vec::with_capacity(roots.len()),
            events,
            setup: options.setup,
            on_event: options.on_event,
            on_ready: options.on_ready,
        };

        // On error `watcher` drops here and closes what was already opened
        for (index, (root, stat)) in roots.iter().zip(stats).enumerate() {
            let path = root.as_ref().to_path_buf();
            let ignore = options.ignore.for_root(&path)?;

            let context = FileContext::parse(&path, NodeType::Directory);
            let id = if context.basename.is_empty() {
                path.to_string_lossy().into_owned()
            } else {
                context.basename.clone()
            };
            let node = Node::directory(id, context, Some(stat));
            node.schedule_setup(watcher.setup.as_ref());

            let subscription = service.subscribe(&path, ignore, EventSink::new(index, tx.clone()))?;
            watcher.watchings.push(Watching {
                path,
                root: node,
                subscription: Some(subscription),
                ready: false,
            });
        }

        Ok(watcher)
    }

    pub fn watchings(&self) -> &[Watching] {
        &self.watchings
    }

    /// Root node of the watched path `path`
    pub fn root(&self, path: impl AsRef<Path>) -> Option<&Node> {
        let path = path.as_ref();
        self.watchings
            .iter()
            .find(|w| w.path == path)
            .map(|w| &w.root)
    }

    /// Root nodes in the order the paths were given
    pub fn roots(&self) -> Vec<Node> {
        self.watchings.iter().map(|w| w.root.clone()).collect()
    }

    /// Whether every open root has finished its initial scan
    pub fn is_ready(&self) -> bool {
        self.watchings.iter().all(|w| w.ready || w.is_closed())
    }

    /// Apply one event to the tree of root `index`
    ///
    /// Does not flush; see [`next_batch`](Self::next_batch).
    pub fn apply(&self, index: usize, event: &FsEvent) -> Result<(), TreeError> {
        let Some(watching) = self.watchings.get(index) else {
            return Ok(());
        };
        let root = &watching.root;
        if watching.is_closed() || root.is_destroyed() {
            debug!("Dropping {:?} for inactive root {}", event.kind, watching.path.display());
            return Ok(());
        }
        let Some(relative) = relative_path(&watching.path, &event.path) else {
            debug!("Dropping event outside root: {}", event.path.display());
            return Ok(());
        };

        debug!("{:?} {}", event.kind, event.path.display());
        match event.kind {
            FsEventKind::Add | FsEventKind::AddDir => {
                if !relative.is_empty() {
                    insert(root, &relative, event.stat.clone(), self.setup.as_ref())?;
                }
            }
            FsEventKind::Change => {
                update(root, &relative, event.stat.clone());
            }
            FsEventKind::Unlink | FsEventKind::UnlinkDir => {
                if relative.is_empty() {
                    info!("Watched root removed: {}", watching.path.display());
                    root.destroy();
                } else {
                    remove(root, &relative)?;
                }
            }
        }

        if let Some(ref on_event) = self.on_event {
            on_event(event);
        }
        Ok(())
    }

    /// Wait for notifications, apply everything queued, then flush
    ///
    /// Returns the number of notifications handled, or `None` once every
    /// subscription is gone.
    pub async fn next_batch(&mut self) -> Option<usize> {
        let first = self.events.recv().await?;
        let mut handled = 1;
        self.handle(first);
        while let Ok(next) = self.events.try_recv() {
            self.handle(next);
            handled += 1;
        }
        flush();
        Some(handled)
    }

    /// Apply whatever is queued right now without waiting, then flush
    pub fn drain(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(next) = self.events.try_recv() {
            self.handle(next);
            handled += 1;
        }
        flush();
        handled
    }

    /// Process batches until every root has reported its initial scan
    pub async fn wait_ready(&mut self) -> bool {
        while !self.is_ready() {
            if self.next_batch().await.is_none() {
                return false;
            }
        }
        true
    }

    /// Process batches until every subscription has gone away
    pub async fn run(&mut self) {
        while self.next_batch().await.is_some() {}
    }

    /// Close every subscription and destroy every root; idempotent
    pub fn close(&mut self) {
        for watching in &mut self.watchings {
            watching.close();
        }
        self.events.close();
        flush();
    }

    fn handle(&mut self, (index, notification): (usize, Notification)) {
        match notification {
            Notification::Event(event) => {
                if let Err(e) = self.apply(index, &event) {
                    warn!("Skipping {:?} {}: {}", event.kind, event.path.display(), e);
                }
            }
            Notification::Ready => {
                let Some(watching) = self.watchings.get_mut(index) else {
                    return;
                };
                if watching.ready || watching.is_closed() {
                    return;
                }
                watching.ready = true;
                info!("Initial scan of {} complete", watching.path.display());
                if let Some(ref on_ready) = self.on_ready {
                    on_ready(&watching.root);
                }
            }
            Notification::Error(message) => {
                warn!("Watch service error: {}", message);
            }
        }
    }
}

impl Drop for TreeWatcher {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for TreeWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeWatcher")
            .field("watchings", &self.watchings)
            .finish()
    }
}

/// `/`-delimited path of `path` relative to `root`
///
/// `Some("")` for the root itself, `None` for paths outside it.
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let segments: Vec<_> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect();
    Some(segments.join("/"))
}
