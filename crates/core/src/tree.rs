//! Path-addressed mutation of a directory tree
//!
//! Paths are `/`-delimited and relative to the root node; empty and `.`
//! segments are skipped. Lookups, updates and removals of paths that do not
//! exist are no-ops, since filesystem events can legitimately race with the
//! tree. Walking *through* a file is a structural conflict for operations
//! that change structure.

use crate::context::{FileContext, NodeType};
use crate::node::{Node, SetupHook, Stat};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors raised by structural tree operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// A non-final path segment resolved to a file
    #[error("Cannot create a directory inside a file: {path}")]
    StructuralConflict { path: String },
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect()
}

/// Resolve `path` from `root` (tracked reads)
///
/// Returns `None` when any segment is missing or an intermediate segment is a
/// file. The empty path resolves to `root` itself.
pub fn lookup(root: &Node, path: &str) -> Option<Node> {
    let mut node = root.clone();
    for id in segments(path) {
        if !node.is_dir() {
            return None;
        }
        node = node.child(id)?;
    }
    Some(node)
}

/// Insert the node at `path`, creating missing intermediate directories
///
/// The leaf becomes a directory if the real filesystem entry currently is one
/// and a file otherwise (including when it cannot be stat'ed). If a child
/// with the leaf's id already exists it is returned unchanged. Every node
/// created here gets `setup` scheduled.
pub fn insert(
    root: &Node,
    path: &str,
    stat: Option<Stat>,
    setup: Option<&SetupHook>,
) -> Result<Node, TreeError> {
    let ids = segments(path);
    let Some((leaf, parents)) = ids.split_last() else {
        return Ok(root.clone());
    };

    let mut parent = root.clone();
    for (depth, id) in parents.iter().enumerate() {
        let next = match parent.child_untracked(id) {
            Some(existing) => existing,
            None => {
                let fullpath = parent.context().fullpath.join(id);
                let context = FileContext::parse(&fullpath, NodeType::Directory);
                let dir = Node::directory(*id, context, Stat::probe(&fullpath));
                attach(&parent, &dir, setup);
                dir
            }
        };

        if !next.is_dir() {
            return Err(TreeError::StructuralConflict {
                path: ids[..=depth].join("/"),
            });
        }
        parent = next;
    }

    if let Some(existing) = parent.child_untracked(leaf) {
        return Ok(existing);
    }

    let fullpath = parent.context().fullpath.join(leaf);
    let node = match probe_type(&fullpath) {
        NodeType::Directory => {
            Node::directory(*leaf, FileContext::parse(&fullpath, NodeType::Directory), stat)
        }
        NodeType::File => Node::file(*leaf, FileContext::parse(&fullpath, NodeType::File), stat),
    };
    attach(&parent, &node, setup);
    Ok(node)
}

/// Replace the metadata of the node at `path`; returns whether it exists
pub fn update(root: &Node, path: &str, stat: Option<Stat>) -> bool {
    match lookup(root, path) {
        Some(node) => {
            node.set_metadata(stat);
            true
        }
        None => false,
    }
}

/// Detach the node at `path` from its parent and destroy it
///
/// Directories take their whole subtree with them, children first. Returns
/// the removed node, or `None` when the path does not resolve. The empty path
/// never resolves here; destroying the root is the caller's business.
pub fn remove(root: &Node, path: &str) -> Result<Option<Node>, TreeError> {
    let ids = segments(path);
    let Some((leaf, parents)) = ids.split_last() else {
        return Ok(None);
    };

    let mut parent = root.clone();
    for (depth, id) in parents.iter().enumerate() {
        let Some(next) = parent.child_untracked(id) else {
            return Ok(None);
        };
        if !next.is_dir() {
            return Err(TreeError::StructuralConflict {
                path: ids[..=depth].join("/"),
            });
        }
        parent = next;
    }

    let Some(children) = parent.children_cell() else {
        return Ok(None);
    };
    let Some(position) = children.with_untracked(|c| c.iter().position(|n| n.id() == *leaf))
    else {
        return Ok(None);
    };

    let removed = children.update(|c| c.remove(position));
    debug!("Removing {}", removed.context().fullpath.display());
    removed.destroy();
    Ok(Some(removed))
}

fn attach(parent: &Node, node: &Node, setup: Option<&SetupHook>) {
    if let Some(children) = parent.children_cell() {
        children.update(|c| c.push(node.clone()));
    }
    debug!(
        "Attached {:?} {}",
        node.node_type(),
        node.context().fullpath.display()
    );
    node.schedule_setup(setup);
}

fn probe_type(path: &Path) -> NodeType {
    match std::fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => NodeType::Directory,
        _ => NodeType::File,
    }
}
