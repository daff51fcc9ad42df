//! Artifact persistence

use crate::{ProjectionError, Result};
use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::Builder;

const TEMP_PREFIX: &str = ".autoexport-";
const TEMP_SUFFIX: &str = ".tmp";

/// Destination for generated artifacts
pub trait ArtifactWriter {
    fn write(&self, path: &Path, content: &str) -> Result<()>;
}

/// Writes to disk atomically: a temporary file in the target directory is
/// persisted over the target, so readers never see a partial artifact
#[derive(Debug, Clone, Copy, Default)]
pub struct FsWriter;

impl ArtifactWriter for FsWriter {
    fn write(&self, path: &Path, content: &str) -> Result<()> {
        let write_err = |source| ProjectionError::Write {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut file = Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(dir)
            .map_err(write_err)?;
        file.write_all(content.as_bytes()).map_err(write_err)?;
        file.persist(path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

/// Whether `path` is one of [`FsWriter`]'s in-flight temporary files
pub fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX))
}

/// Keeps every write in memory, in order
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    writes: Rc<RefCell<Vec<(PathBuf, String)>>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<(PathBuf, String)> {
        self.writes.borrow().clone()
    }

    /// Last content written to `path`
    pub fn last(&self, path: &Path) -> Option<String> {
        self.writes
            .borrow()
            .iter()
            .rev()
            .find(|(p, _)| p == path)
            .map(|(_, content)| content.clone())
    }

    pub fn count(&self) -> usize {
        self.writes.borrow().len()
    }
}

impl ArtifactWriter for MemoryWriter {
    fn write(&self, path: &Path, content: &str) -> Result<()> {
        self.writes
            .borrow_mut()
            .push((path.to_path_buf(), content.to_string()));
        Ok(())
    }
}
