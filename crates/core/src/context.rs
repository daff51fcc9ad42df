//! Path metadata derived from a node's full path

use std::path::{Path, PathBuf};

/// Discriminant of a tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// Regular file (or anything that is not a directory)
    File,
    /// Directory
    Directory,
}

/// Name parts of a path, fixed once a node is constructed
///
/// Invariant: `fullpath == dirname.join(basename)` whenever `basename` is
/// non-empty; otherwise `fullpath == dirname`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContext {
    /// Base name without the final extension (full base name for directories)
    pub filename: String,
    /// Extension without the leading `.` (empty for directories)
    pub extname: String,
    /// Base name including the extension
    pub basename: String,
    /// Directory containing the entry
    pub dirname: PathBuf,
    /// `dirname` joined with `basename`
    pub fullpath: PathBuf,
}

impl FileContext {
    /// Resolve the name parts of `fullpath`
    ///
    /// Pure and total: a path without a final component (`.`, `/`, `..`)
    /// keeps itself as `fullpath` and `dirname`, with empty names.
    pub fn parse(fullpath: impl AsRef<Path>, kind: NodeType) -> Self {
        let fullpath = fullpath.as_ref();

        let Some(name) = fullpath.file_name() else {
            return Self {
                filename: String::new(),
                extname: String::new(),
                basename: String::new(),
                dirname: fullpath.to_path_buf(),
                fullpath: fullpath.to_path_buf(),
            };
        };
        let basename = name.to_string_lossy().into_owned();
        let dirname = fullpath
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let (filename, extname) = match kind {
            NodeType::Directory => (basename.clone(), String::new()),
            NodeType::File => {
                let stem = fullpath
                    .file_stem()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| basename.clone());
                let ext = fullpath
                    .extension()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                (stem, ext)
            }
        };

        Self {
            filename,
            extname,
            fullpath: fullpath.to_path_buf(),
            basename,
            dirname,
        }
    }
}
