//! Projection configuration

use crate::filter::default_filter;
use crate::format::default_formatter;
use crate::gate::WriteErrorCallback;
use crate::order::default_compare;
use crate::writer::{ArtifactWriter, FsWriter};
use crate::ProjectionError;
use autoexport_core::Node;
use autoexport_watcher::{FsEvent, IgnoreRules};
use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

/// Default artifact file name
pub const DEFAULT_OUTPUT: &str = "index.ts";

/// Default debounce interval
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

pub type Filter = Rc<dyn Fn(&Node) -> bool>;
pub type Compare = Rc<dyn Fn(&Node, &Node) -> Ordering>;
pub type Formatter = Rc<dyn Fn(&Node) -> String>;
/// Content for a directory's sorted view; `None` means "write nothing"
pub type Builder = Rc<dyn Fn(&[Node], &Node) -> Option<String>>;

/// Artifact file name inside each directory
#[derive(Clone)]
pub enum Output {
    Fixed(String),
    PerNode(Rc<dyn Fn(&Node) -> String>),
}

impl Output {
    pub fn file_name(&self, node: &Node) -> String {
        match self {
            Output::Fixed(name) => name.clone(),
            Output::PerNode(f) => f(node),
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Output::Fixed(DEFAULT_OUTPUT.to_string())
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Fixed(name) => f.debug_tuple("Fixed").field(name).finish(),
            Output::PerNode(_) => f.write_str("PerNode(..)"),
        }
    }
}

/// Everything [`create`](crate::create) needs
#[derive(Clone)]
pub struct ProjectionOptions {
    /// Directories to watch
    pub paths: Vec<PathBuf>,
    pub ignore: IgnoreRules,
    pub output: Output,
    /// Zero writes synchronously
    pub debounce: Duration,
    pub filter: Filter,
    pub compare: Compare,
    pub formatter: Formatter,
    /// Replaces the default line-joining builder (which uses `formatter`)
    pub builder: Option<Builder>,
    pub writer: Rc<dyn ArtifactWriter>,
    pub on_event: Option<Rc<dyn Fn(&FsEvent)>>,
    pub on_ready: Option<Rc<dyn Fn(&Node)>>,
    /// Told about every artifact write that failed
    pub on_write_error: Option<WriteErrorCallback>,
}

impl ProjectionOptions {
    pub fn new<P: Into<PathBuf>>(paths: impl IntoIterator<Item = P>) -> Self {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            ignore: IgnoreRules::default(),
            output: Output::default(),
            debounce: DEFAULT_DEBOUNCE,
            filter: Rc::new(default_filter),
            compare: Rc::new(default_compare),
            formatter: Rc::new(default_formatter),
            builder: None,
            writer: Rc::new(FsWriter),
            on_event: None,
            on_ready: None,
            on_write_error: None,
        }
    }

    pub fn with_ignore(mut self, ignore: IgnoreRules) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn with_output(mut self, name: impl Into<String>) -> Self {
        self.output = Output::Fixed(name.into());
        self
    }

    pub fn with_output_fn(mut self, f: impl Fn(&Node) -> String + 'static) -> Self {
        self.output = Output::PerNode(Rc::new(f));
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_filter(mut self, f: impl Fn(&Node) -> bool + 'static) -> Self {
        self.filter = Rc::new(f);
        self
    }

    pub fn with_compare(mut self, f: impl Fn(&Node, &Node) -> Ordering + 'static) -> Self {
        self.compare = Rc::new(f);
        self
    }

    pub fn with_formatter(mut self, f: impl Fn(&Node) -> String + 'static) -> Self {
        self.formatter = Rc::new(f);
        self
    }

    pub fn with_builder(mut self, f: impl Fn(&[Node], &Node) -> Option<String> + 'static) -> Self {
        self.builder = Some(Rc::new(f));
        self
    }

    pub fn with_writer(mut self, writer: impl ArtifactWriter + 'static) -> Self {
        self.writer = Rc::new(writer);
        self
    }

    pub fn on_event(mut self, f: impl Fn(&FsEvent) + 'static) -> Self {
        self.on_event = Some(Rc::new(f));
        self
    }

    pub fn on_ready(mut self, f: impl Fn(&Node) + 'static) -> Self {
        self.on_ready = Some(Rc::new(f));
        self
    }

    pub fn on_write_error(mut self, f: impl Fn(&ProjectionError) + 'static) -> Self {
        self.on_write_error = Some(Rc::new(f));
        self
    }
}

impl fmt::Debug for ProjectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectionOptions")
            .field("paths", &self.paths)
            .field("ignore", &self.ignore)
            .field("output", &self.output)
            .field("debounce", &self.debounce)
            .field("builder", &self.builder.is_some())
            .finish_non_exhaustive()
    }
}
