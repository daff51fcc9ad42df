//! Watch session entry point

use crate::options::ProjectionOptions;
use crate::pipeline::Projection;
use crate::writer::is_temp_file;
use crate::Result;
use autoexport_core::Node;
use autoexport_watcher::{IgnoreRule, NotifyService, TreeWatcher, WatchOptions, WatchService};
use std::rc::Rc;
use std::time::Duration;
use tracing::info;

/// Watch `options.paths` and keep an export index in every directory
pub fn create(options: ProjectionOptions) -> Result<AutoExport> {
    create_with_service(options, &NotifyService)
}

/// [`create`] with a caller-supplied watch service
pub fn create_with_service(
    options: ProjectionOptions,
    service: &dyn WatchService,
) -> Result<AutoExport> {
    let projection = Rc::new(Projection::new(&options));

    // Our own in-flight temp files must never reach a view
    let ignore = options
        .ignore
        .clone()
        .with_rule(IgnoreRule::predicate(is_temp_file));

    let watch_options = WatchOptions {
        setup: Some(projection.setup_hook()),
        ignore,
        on_event: options.on_event.clone(),
        on_ready: options.on_ready.clone(),
    };
    let watcher = TreeWatcher::with_service(&options.paths, watch_options, service)?;

    info!(
        "Generating exports for {} root(s), debounce {:?}",
        options.paths.len(),
        options.debounce
    );
    Ok(AutoExport { watcher })
}

/// Running session returned by [`create`]
///
/// The session does nothing until driven: call [`run`](Self::run) (or the
/// finer-grained methods) from inside a `tokio::task::LocalSet` when the
/// debounce interval is non-zero. Dropping the handle stops the session.
#[derive(Debug)]
pub struct AutoExport {
    watcher: TreeWatcher,
}

impl AutoExport {
    pub fn roots(&self) -> Vec<Node> {
        self.watcher.roots()
    }

    pub fn watcher(&self) -> &TreeWatcher {
        &self.watcher
    }

    pub fn is_ready(&self) -> bool {
        self.watcher.is_ready()
    }

    /// Apply the next batch of changes; `None` once stopped
    pub async fn next_batch(&mut self) -> Option<usize> {
        self.watcher.next_batch().await
    }

    /// Process changes until every root has finished its initial scan
    pub async fn wait_ready(&mut self) -> bool {
        self.watcher.wait_ready().await
    }

    /// Process changes until nothing arrives for `quiet`
    ///
    /// Debounced writes and the events they cause are absorbed as long as
    /// `quiet` exceeds the debounce interval.
    pub async fn settle(&mut self, quiet: Duration) {
        while let Ok(Some(_)) = tokio::time::timeout(quiet, self.watcher.next_batch()).await {}
    }

    /// Process changes until stopped
    pub async fn run(&mut self) {
        self.watcher.run().await;
    }

    /// Tear everything down; idempotent
    ///
    /// Every directory's reaction is disposed and any debounced write still
    /// pending is dropped.
    pub fn stop(&mut self) {
        self.watcher.close();
    }

    pub fn is_stopped(&self) -> bool {
        self.watcher.watchings().iter().all(|w| w.is_closed())
    }
}
