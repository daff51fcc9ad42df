//! Filesystem watching for autoexport
//!
//! This crate mirrors watched directories as reactive node trees:
//! - Initial scan followed by live platform events (via `notify`)
//! - Rescan of directories that appear while watching
//! - Ignore rules applied at the source (exact, regex, predicate, prefix, .gitignore)
//! - Per-node setup hooks with cleanup on removal

pub mod event;
pub mod ignore;
pub mod scan;
pub mod service;
pub mod watch;

pub use event::{EventSink, FsEvent, FsEventKind, Notification};
pub use ignore::{IgnoreConfig, IgnoreRule, IgnoreRules, PrefixConfig, RootIgnore};
pub use service::{NotifyService, Subscription, WatchService};
pub use watch::{EventCallback, ReadyCallback, TreeWatcher, WatchOptions, Watching};

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while setting up a watch
#[derive(Debug, Error)]
pub enum WatchError {
    /// A watched root exists but is not a directory
    #[error("The path must be a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Failed to stat {}: {source}", .path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File watcher error: {0}")]
    Notify(#[from] notify::Error),

    #[error("Failed to load ignore file: {0}")]
    Ignore(#[from] ::ignore::Error),

    #[error("Invalid ignore pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("Failed to start scanner thread: {0}")]
    Spawn(#[source] std::io::Error),
}
