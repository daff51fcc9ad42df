//! End-to-end watching of a real directory through the platform watcher

use autoexport_core::lookup;
use autoexport_watcher::{IgnoreRule, IgnoreRules, TreeWatcher, WatchOptions};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(10);

async fn wait_until(watcher: &mut TreeWatcher, mut done: impl FnMut() -> bool) {
    timeout(WAIT, async {
        while !done() {
            if watcher.next_batch().await.is_none() {
                break;
            }
        }
    })
    .await
    .expect("tree did not reach the expected state");
    assert!(done());
}

#[tokio::test]
async fn test_initial_scan_then_live_changes() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("src/utils")).unwrap();
    fs::write(temp_dir.path().join("src/utils/a.ts"), "export const a = 1;").unwrap();

    let mut watcher = TreeWatcher::watch(&[temp_dir.path()], WatchOptions::new()).unwrap();
    assert!(timeout(WAIT, watcher.wait_ready()).await.unwrap());

    let root = watcher.roots()[0].clone();
    assert!(lookup(&root, "src/utils/a.ts").is_some());
    assert!(lookup(&root, "src/utils").unwrap().is_dir());

    fs::write(temp_dir.path().join("src/b.ts"), "").unwrap();
    wait_until(&mut watcher, || lookup(&root, "src/b.ts").is_some()).await;

    // Contents of a directory created in one go are picked up by the rescan
    fs::create_dir_all(temp_dir.path().join("lib/deep")).unwrap();
    fs::write(temp_dir.path().join("lib/deep/c.ts"), "").unwrap();
    wait_until(&mut watcher, || lookup(&root, "lib/deep/c.ts").is_some()).await;

    let removed = lookup(&root, "src/utils/a.ts").unwrap();
    fs::remove_dir_all(temp_dir.path().join("src/utils")).unwrap();
    wait_until(&mut watcher, || lookup(&root, "src/utils").is_none()).await;
    assert!(removed.is_destroyed());

    watcher.close();
    assert!(root.is_destroyed());
}

#[tokio::test]
async fn test_ignored_entries_never_enter_the_tree() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("node_modules/pkg")).unwrap();
    fs::write(temp_dir.path().join("node_modules/pkg/index.js"), "").unwrap();
    fs::write(temp_dir.path().join("main.ts"), "").unwrap();

    let ignore = IgnoreRules::new()
        .with_rule(IgnoreRule::exact("node_modules"))
        .with_rule(IgnoreRule::pattern(r"\.log$").unwrap());
    let mut watcher =
        TreeWatcher::watch(&[temp_dir.path()], WatchOptions::new().with_ignore(ignore)).unwrap();
    assert!(timeout(WAIT, watcher.wait_ready()).await.unwrap());

    let root = watcher.roots()[0].clone();
    assert!(lookup(&root, "main.ts").is_some());
    assert!(lookup(&root, "node_modules").is_none());

    fs::write(temp_dir.path().join("debug.log"), "").unwrap();
    fs::write(temp_dir.path().join("other.ts"), "").unwrap();
    wait_until(&mut watcher, || lookup(&root, "other.ts").is_some()).await;
    assert!(lookup(&root, "debug.log").is_none());

    // Live changes inside an ignored directory stay out as well
    fs::create_dir_all(temp_dir.path().join("node_modules/fresh")).unwrap();
    fs::write(temp_dir.path().join("node_modules/fresh/new.js"), "").unwrap();
    fs::write(temp_dir.path().join("node_modules/pkg/new.js"), "").unwrap();
    fs::write(temp_dir.path().join("last.ts"), "").unwrap();
    wait_until(&mut watcher, || lookup(&root, "last.ts").is_some()).await;
    assert!(lookup(&root, "node_modules").is_none());
}
