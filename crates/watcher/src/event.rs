//! Notifications delivered by a watch service

use autoexport_core::Stat;
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedSender;

/// Type of filesystem change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsEventKind {
    /// File appeared
    Add,
    /// Directory appeared
    AddDir,
    /// Entry metadata or contents changed
    Change,
    /// File disappeared
    Unlink,
    /// Directory disappeared
    UnlinkDir,
}

impl FsEventKind {
    pub fn is_add(self) -> bool {
        matches!(self, FsEventKind::Add | FsEventKind::AddDir)
    }

    pub fn is_unlink(self) -> bool {
        matches!(self, FsEventKind::Unlink | FsEventKind::UnlinkDir)
    }
}

/// One filesystem change under a watched root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub kind: FsEventKind,
    /// Path of the entry, in the same form as the watched root
    /// (the root joined with the entry's relative path)
    pub path: PathBuf,
    /// Metadata at the time of the event; `None` for removals
    pub stat: Option<Stat>,
}

impl FsEvent {
    pub fn new(kind: FsEventKind, path: impl Into<PathBuf>, stat: Option<Stat>) -> Self {
        Self {
            kind,
            path: path.into(),
            stat,
        }
    }
}

/// What a watch service can report for a root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Event(FsEvent),
    /// The initial scan of the root has been reported
    Ready,
    /// Non-fatal service failure
    Error(String),
}

/// Sending half handed to a watch service, tagged with the root it serves
#[derive(Debug, Clone)]
pub struct EventSink {
    root: usize,
    tx: UnboundedSender<(usize, Notification)>,
}

impl EventSink {
    pub fn new(root: usize, tx: UnboundedSender<(usize, Notification)>) -> Self {
        Self { root, tx }
    }

    /// Returns `false` once the receiving side is gone
    pub fn event(&self, event: FsEvent) -> bool {
        self.send(Notification::Event(event))
    }

    pub fn ready(&self) -> bool {
        self.send(Notification::Ready)
    }

    pub fn error(&self, message: impl Into<String>) -> bool {
        self.send(Notification::Error(message.into()))
    }

    fn send(&self, notification: Notification) -> bool {
        self.tx.send((self.root, notification)).is_ok()
    }
}
