//! In-memory mirror of a directory subtree for Autoexport
//!
//! This crate provides:
//! - Path metadata resolution (`FileContext`)
//! - A single-threaded reactive substrate (observables, computeds, reactions)
//! - The file/directory node model with a setup/cleanup lifecycle
//! - Path-addressed tree mutation (lookup, insert, update, remove)

pub mod context;
pub mod node;
pub mod reactive;
pub mod tree;

// Re-exports
pub use context::{FileContext, NodeType};
pub use node::{Cleanup, Lifecycle, Node, SetupHook, Stat};
pub use reactive::{flush, tick, Computed, Observable, Reaction};
pub use tree::{insert, lookup, remove, update, TreeError};

/// Result type for tree operations
pub type Result<T> = std::result::Result<T, TreeError>;
