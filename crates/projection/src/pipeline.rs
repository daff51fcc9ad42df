//! Per-directory projection
//!
//! Every directory node gets:
//! - a view: its children, filtered and sorted (memoized)
//! - content: the builder applied to the view (memoized)
//! - a reaction handing changed, non-empty content to a [`WriteGate`]
//!
//! The returned cleanup disposes the reaction and the gate together, so no
//! write for a directory happens once its node is destroyed.

use crate::format::build_lines;
use crate::gate::{WriteErrorCallback, WriteGate};
use crate::options::{Builder, Compare, Filter, Output, ProjectionOptions};
use crate::writer::ArtifactWriter;
use autoexport_core::{Cleanup, Computed, Node, Reaction, SetupHook};
use std::rc::Rc;
use std::time::Duration;
use tracing::debug;

/// Settings shared by every directory of one session
pub struct Projection {
    filter: Filter,
    compare: Compare,
    builder: Builder,
    output: Output,
    debounce: Duration,
    writer: Rc<dyn ArtifactWriter>,
    on_write_error: Option<WriteErrorCallback>,
}

impl Projection {
    pub fn new(options: &ProjectionOptions) -> Self {
        let builder = match options.builder {
            Some(ref builder) => Rc::clone(builder),
            None => {
                let formatter = Rc::clone(&options.formatter);
                Rc::new(move |view: &[Node], _: &Node| build_lines(view, |n| formatter(n))) as Builder
            }
        };

        Self {
            filter: Rc::clone(&options.filter),
            compare: Rc::clone(&options.compare),
            builder,
            output: options.output.clone(),
            debounce: options.debounce,
            writer: Rc::clone(&options.writer),
            on_write_error: options.on_write_error.clone(),
        }
    }

    /// Setup hook attaching this projection to each directory node
    pub fn setup_hook(self: &Rc<Self>) -> SetupHook {
        let projection = Rc::clone(self);
        Rc::new(move |node: &Node| projection.attach(node))
    }

    /// Start projecting `node`; files get nothing
    pub fn attach(&self, node: &Node) -> Option<Cleanup> {
        if !node.is_dir() {
            return None;
        }

        let view = {
            let node = node.clone();
            let filter = Rc::clone(&self.filter);
            let compare = Rc::clone(&self.compare);
            Computed::new(move || {
                let mut view: Vec<Node> = node.with_children(|children| {
                    children.iter().filter(|c| filter(c)).cloned().collect()
                });
                view.sort_by(|a, b| compare(a, b));
                view
            })
        };

        let content = {
            let node = node.clone();
            let builder = Rc::clone(&self.builder);
            Computed::new(move || view.with(|view| builder(view, &node)))
        };

        let target = node.context().fullpath.join(self.output.file_name(node));
        let gate = WriteGate::with_error_callback(
            target,
            self.debounce,
            Rc::clone(&self.writer),
            self.on_write_error.clone(),
        );

        let sink = gate.clone();
        let reaction = Reaction::new(
            move || content.get(),
            move |next: &Option<String>, _| match next {
                Some(text) => sink.submit(format!("{text}\n")),
                None => debug!("Nothing to export for {}", sink.path().display()),
            },
        );
        debug!("Projecting {}", gate.path().display());

        Some(Box::new(move || {
            reaction.dispose();
            gate.dispose();
        }))
    }
}
