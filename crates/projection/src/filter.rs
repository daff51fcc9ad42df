//! Default child filter

use autoexport_core::Node;
use regex::Regex;
use std::sync::OnceLock;

fn index_regex() -> &'static Regex {
    static INDEX: OnceLock<Regex> = OnceLock::new();
    INDEX.get_or_init(|| Regex::new(r"^index\.m?(t|j)sx?$").expect("index pattern is valid"))
}

/// Whether `name` is an index module (`index.ts`, `index.mjs`, `index.tsx`, ...)
pub fn is_index_file(name: &str) -> bool {
    index_regex().is_match(name)
}

/// Keep files that are not index modules and directories that have one
///
/// Reads a directory child's children, so the owning view is recomputed
/// when an index file appears in or disappears from a subdirectory.
pub fn default_filter(child: &Node) -> bool {
    if child.is_dir() {
        child.with_children(|children| children.iter().any(|c| is_index_file(c.id())))
    } else {
        !is_index_file(child.id())
    }
}
