//! Watch services
//!
//! A [`WatchService`] reports the contents and changes of a root as
//! [`Notification`](crate::Notification)s: first one add event per existing
//! entry, then `Ready`, then live changes. The tree orchestrator only talks
//! to this trait; [`NotifyService`] implements it on top of the platform
//! watcher.

use crate::event::{EventSink, FsEvent, FsEventKind};
use crate::ignore::RootIgnore;
use crate::scan::scan;
use crate::WatchError;
use autoexport_core::Stat;
use notify::event::{ModifyKind, RemoveKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Source of filesystem notifications for a root
pub trait WatchService {
    /// Start reporting changes under `root` into `sink`
    ///
    /// Entries matched by `ignore` must never be reported.
    fn subscribe(
        &self,
        root: &Path,
        ignore: RootIgnore,
        sink: EventSink,
    ) -> Result<Box<dyn Subscription>, WatchError>;
}

/// Live subscription; no notifications are delivered after `close`
pub trait Subscription {
    fn close(&mut self);
}

/// [`WatchService`] backed by the platform watcher (inotify, FSEvents, ...)
#[derive(Debug, Clone, Copy, Default)]
pub struct NotifyService;

impl WatchService for NotifyService {
    fn subscribe(
        &self,
        root: &Path,
        ignore: RootIgnore,
        sink: EventSink,
    ) -> Result<Box<dyn Subscription>, WatchError> {
        let watch_root = root.canonicalize().map_err(|source| WatchError::Stat {
            path: root.to_path_buf(),
            source,
        })?;
        let translator = Arc::new(Translator {
            root: root.to_path_buf(),
            watch_root,
            ignore,
        });
        let sink = Arc::new(Mutex::new(Some(sink)));

        let callback_sink = Arc::clone(&sink);
        let callback_translator = Arc::clone(&translator);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let guard = callback_sink.lock();
            let Some(sink) = guard.as_ref() else {
                return;
            };
            match res {
                Ok(event) => {
                    for change in callback_translator.translate(&event) {
                        sink.event(change);
                    }
                }
                Err(e) => {
                    warn!("File watcher error: {}", e);
                    sink.error(e.to_string());
                }
            }
        })?;
        watcher.watch(&translator.watch_root, RecursiveMode::Recursive)?;
        info!("Watching {}", root.display());

        // Initial scan runs off the caller's thread; live events may
        // interleave with it, which the tree absorbs since adds are idempotent
        let scan_sink = Arc::clone(&sink);
        let scan_translator = Arc::clone(&translator);
        std::thread::Builder::new()
            .name("autoexport-scan".to_string())
            .spawn(move || {
                let emitted = scan(&scan_translator.root, &scan_translator.ignore, |event| {
                    scan_sink.lock().as_ref().is_some_and(|sink| sink.event(event))
                });
                debug!(
                    "Initial scan of {} reported {} entries",
                    scan_translator.root.display(),
                    emitted
                );
                if let Some(sink) = scan_sink.lock().as_ref() {
                    sink.ready();
                }
            })
            .map_err(WatchError::Spawn)?;

        Ok(Box::new(NotifySubscription {
            watcher: Some(watcher),
            sink,
        }))
    }
}

struct NotifySubscription {
    watcher: Option<RecommendedWatcher>,
    sink: Arc<Mutex<Option<EventSink>>>,
}

impl Subscription for NotifySubscription {
    fn close(&mut self) {
        self.sink.lock().take();
        // Dropping the platform watcher removes its OS watches
        self.watcher.take();
    }
}

impl Drop for NotifySubscription {
    fn drop(&mut self) {
        self.close();
    }
}

/// Maps platform events onto add/change/unlink events for one root
struct Translator {
    /// Root as given by the caller; reported paths use this form
    root: PathBuf,
    /// Canonical root the platform watcher reports against
    watch_root: PathBuf,
    ignore: RootIgnore,
}

impl Translator {
    fn translate(&self, event: &notify::Event) -> Vec<FsEvent> {
        let mut out = Vec::new();
        match event.kind {
            EventKind::Create(_) => {
                for path in &event.paths {
                    self.appeared(path, &mut out);
                }
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if event.paths.len() == 2 => {
                self.disappeared(&event.paths[0], false, &mut out);
                self.appeared(&event.paths[1], &mut out);
            }
            EventKind::Modify(ModifyKind::Name(_)) => {
                // One side of a rename; whether it is the old or new name
                // is only known by looking
                for path in &event.paths {
                    if path.symlink_metadata().is_ok() {
                        self.appeared(path, &mut out);
                    } else {
                        self.disappeared(path, false, &mut out);
                    }
                }
            }
            EventKind::Modify(_) => {
                for path in &event.paths {
                    self.changed(path, &mut out);
                }
            }
            EventKind::Remove(kind) => {
                for path in &event.paths {
                    self.disappeared(path, kind == RemoveKind::Folder, &mut out);
                }
            }
            EventKind::Access(_) | EventKind::Any | EventKind::Other => {}
        }
        out
    }

    /// Reported path for a platform path, `None` if it is outside the root
    fn display_path(&self, path: &Path) -> Option<PathBuf> {
        let relative = path
            .strip_prefix(&self.watch_root)
            .or_else(|_| path.strip_prefix(&self.root))
            .ok()?;
        if relative.as_os_str().is_empty() {
            Some(self.root.clone())
        } else {
            Some(self.root.join(relative))
        }
    }

    fn appeared(&self, path: &Path, out: &mut Vec<FsEvent>) {
        let Some(display) = self.display_path(path) else {
            return;
        };
        let Ok(metadata) = std::fs::metadata(path) else {
            // Gone again before we got to it; the removal follows
            return;
        };
        let is_dir = metadata.is_dir();
        if self.ignore.should_ignore(&display, is_dir) {
            return;
        }

        let kind = if is_dir {
            FsEventKind::AddDir
        } else {
            FsEventKind::Add
        };
        out.push(FsEvent::new(kind, &display, Some(Stat::from(&metadata))));

        if is_dir && display != self.root {
            scan(&display, &self.ignore, |event| {
                out.push(event);
                true
            });
        }
    }

    fn disappeared(&self, path: &Path, is_dir: bool, out: &mut Vec<FsEvent>) {
        let Some(display) = self.display_path(path) else {
            return;
        };
        if self.ignore.should_ignore(&display, is_dir) {
            return;
        }
        let kind = if is_dir {
            FsEventKind::UnlinkDir
        } else {
            FsEventKind::Unlink
        };
        out.push(FsEvent::new(kind, display, None));
    }

    fn changed(&self, path: &Path, out: &mut Vec<FsEvent>) {
        let Some(display) = self.display_path(path) else {
            return;
        };
        let Ok(metadata) = std::fs::metadata(path) else {
            return;
        };
        // Directory attribute churn is not a content change
        if metadata.is_dir() || self.ignore.should_ignore(&display, false) {
            return;
        }
        out.push(FsEvent::new(
            FsEventKind::Change,
            display,
            Some(Stat::from(&metadata)),
        ));
    }
}
