//! Directory scanner
//!
//! Reports the existing contents of a directory as add events. Used for the
//! initial scan of a root and again for every directory that appears while
//! watching, since entries created before the OS watch is installed on the
//! new directory are never reported by the platform.

use crate::event::{FsEvent, FsEventKind};
use crate::ignore::RootIgnore;
use autoexport_core::Stat;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Walk `dir` (excluding itself), parents before children
///
/// Ignored directories are pruned with their whole subtree. `emit` returning
/// `false` stops the walk. Returns the number of events emitted.
pub fn scan(dir: &Path, ignore: &RootIgnore, mut emit: impl FnMut(FsEvent) -> bool) -> usize {
    let mut emitted = 0;

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !ignore.should_ignore(e.path(), e.file_type().is_dir()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                // Entries vanishing mid-walk are expected
                debug!("Skipping unreadable entry under {}: {}", dir.display(), e);
                continue;
            }
        };

        let kind = if entry.file_type().is_dir() {
            FsEventKind::AddDir
        } else {
            FsEventKind::Add
        };
        let stat = match entry.metadata() {
            Ok(metadata) => Some(Stat::from(&metadata)),
            Err(e) => {
                warn!("Failed to stat {}: {}", entry.path().display(), e);
                None
            }
        };

        if !emit(FsEvent::new(kind, entry.path(), stat)) {
            break;
        }
        emitted += 1;
    }

    emitted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ignore::{IgnoreRule, IgnoreRules};
    use std::fs;
    use tempfile::TempDir;

    fn collect(dir: &Path, rules: IgnoreRules) -> Vec<(FsEventKind, String)> {
        let ignore = rules.for_root(dir).unwrap();
        let mut seen = Vec::new();
        scan(dir, &ignore, |event| {
            let rel = event.path.strip_prefix(dir).unwrap();
            seen.push((event.kind, rel.to_string_lossy().replace('\\', "/")));
            true
        });
        seen
    }

    #[test]
    fn test_scan_reports_parents_before_children() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("a/b")).unwrap();
        fs::write(temp_dir.path().join("a/b/c.ts"), "").unwrap();
        fs::write(temp_dir.path().join("z.ts"), "").unwrap();

        let seen = collect(temp_dir.path(), IgnoreRules::new());
        assert_eq!(
            seen,
            vec![
                (FsEventKind::AddDir, "a".to_string()),
                (FsEventKind::AddDir, "a/b".to_string()),
                (FsEventKind::Add, "a/b/c.ts".to_string()),
                (FsEventKind::Add, "z.ts".to_string()),
            ]
        );
    }

    #[test]
    fn test_scan_prunes_ignored_directories() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("node_modules/pkg")).unwrap();
        fs::write(temp_dir.path().join("node_modules/pkg/index.js"), "").unwrap();
        fs::write(temp_dir.path().join("main.ts"), "").unwrap();

        let rules = IgnoreRules::new().with_rule(IgnoreRule::exact("node_modules"));
        let seen = collect(temp_dir.path(), rules);
        assert_eq!(seen, vec![(FsEventKind::Add, "main.ts".to_string())]);
    }

    #[test]
    fn test_scan_stops_when_emit_refuses() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["a.ts", "b.ts", "c.ts"] {
            fs::write(temp_dir.path().join(name), "").unwrap();
        }

        let ignore = IgnoreRules::new().for_root(temp_dir.path()).unwrap();
        let mut budget = 2;
        let emitted = scan(temp_dir.path(), &ignore, |_| {
            budget -= 1;
            budget > 0
        });
        assert_eq!(emitted, 1);
    }

    #[test]
    fn test_scan_carries_stat() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("data.json"), "{}").unwrap();

        let ignore = IgnoreRules::new().for_root(temp_dir.path()).unwrap();
        let mut stats = Vec::new();
        scan(temp_dir.path(), &ignore, |event| {
            stats.push(event.stat);
            true
        });

        let stat = stats[0].clone().unwrap();
        assert_eq!(stat.len, 2);
        assert!(!stat.is_dir);
    }
}
