//! Export index generation for watched directories
//!
//! This crate provides:
//! - Default filter, ordering, formatter and builder for `index.ts` files
//! - Per-directory projection: memoized view and content, reaction-driven writes
//! - Debounced, change-detecting write gate
//! - Atomic artifact writer
//! - `create` entry point returning a stoppable session handle

pub mod filter;
pub mod format;
pub mod gate;
pub mod options;
pub mod order;
pub mod pipeline;
pub mod session;
pub mod writer;

// Re-exports
pub use filter::{default_filter, is_index_file};
pub use format::{build_lines, default_formatter, pascal_case};
pub use gate::{WriteErrorCallback, WriteGate};
pub use options::{Output, ProjectionOptions, DEFAULT_DEBOUNCE, DEFAULT_OUTPUT};
pub use order::{default_compare, locale_compare};
pub use pipeline::Projection;
pub use session::{create, create_with_service, AutoExport};
pub use writer::{ArtifactWriter, FsWriter, MemoryWriter};

use autoexport_watcher::WatchError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a projection session
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Watch(#[from] WatchError),
}

/// Result type for projection operations
pub type Result<T> = std::result::Result<T, ProjectionError>;
