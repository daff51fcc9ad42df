//! Ignore rules applied at the watch source
//!
//! An ignored entry is never reported, so it never enters the tree. An
//! ignored directory hides its whole subtree, both from the initial scan and
//! from live events.
//!
//! Rule kinds:
//! 1. Exact: entry name or full path equals a string
//! 2. Pattern: regex matched against the full path
//! 3. Predicate: arbitrary function of the full path
//! 4. Prefix: a path and everything below it, or, when not recursive, only
//!    the files directly inside it
//! 5. .gitignore in the root (optional, disabled by default)
//!
//! "Full path" is the watched root, as given, joined with the entry's
//! relative path; it is the same string a node's context carries.

use crate::WatchError;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type IgnorePredicate = Arc<dyn Fn(&Path) -> bool + Send + Sync>;

/// A single ignore rule
#[derive(Clone)]
pub enum IgnoreRule {
    Exact(String),
    Pattern(Regex),
    Predicate(IgnorePredicate),
    Prefix { path: PathBuf, recursive: bool },
}

impl IgnoreRule {
    pub fn exact(value: impl Into<String>) -> Self {
        IgnoreRule::Exact(value.into())
    }

    pub fn pattern(pattern: &str) -> Result<Self, WatchError> {
        Ok(IgnoreRule::Pattern(Regex::new(pattern)?))
    }

    pub fn predicate(f: impl Fn(&Path) -> bool + Send + Sync + 'static) -> Self {
        IgnoreRule::Predicate(Arc::new(f))
    }

    /// Without `recursive` the rule covers only the files directly inside
    /// `path`; subdirectories stay visible
    pub fn prefix(path: impl Into<PathBuf>, recursive: bool) -> Self {
        IgnoreRule::Prefix {
            path: path.into(),
            recursive,
        }
    }

    pub fn matches(&self, path: &Path, is_dir: bool) -> bool {
        match self {
            IgnoreRule::Exact(value) => {
                path.as_os_str() == value.as_str()
                    || path.file_name().is_some_and(|name| name == value.as_str())
            }
            IgnoreRule::Pattern(regex) => regex.is_match(&path.to_string_lossy()),
            IgnoreRule::Predicate(f) => f(path),
            IgnoreRule::Prefix { path: prefix, recursive } => {
                if *recursive {
                    path.starts_with(prefix)
                } else {
                    !is_dir && path.parent() == Some(prefix.as_path())
                }
            }
        }
    }
}

impl fmt::Debug for IgnoreRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreRule::Exact(value) => f.debug_tuple("Exact").field(value).finish(),
            IgnoreRule::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            IgnoreRule::Predicate(_) => f.write_str("Predicate(..)"),
            IgnoreRule::Prefix { path, recursive } => f
                .debug_struct("Prefix")
                .field("path", path)
                .field("recursive", recursive)
                .finish(),
        }
    }
}

/// Combined rule set for one watch session
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    rules: Vec<IgnoreRule>,
    use_gitignore: bool,
}

impl IgnoreRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build rules from configuration
    pub fn from_config(config: &IgnoreConfig) -> Result<Self, WatchError> {
        let mut rules = Self::new().with_gitignore(config.use_gitignore);
        for name in &config.exact {
            rules.push(IgnoreRule::exact(name.clone()));
        }
        for pattern in &config.patterns {
            rules.push(IgnoreRule::pattern(pattern)?);
        }
        for prefix in &config.prefixes {
            rules.push(IgnoreRule::prefix(&prefix.path, prefix.recursive));
        }
        Ok(rules)
    }

    pub fn with_rule(mut self, rule: IgnoreRule) -> Self {
        self.push(rule);
        self
    }

    pub fn with_gitignore(mut self, enabled: bool) -> Self {
        self.use_gitignore = enabled;
        self
    }

    pub fn push(&mut self, rule: IgnoreRule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && !self.use_gitignore
    }

    /// Resolve the rules against one watched root
    pub fn for_root(&self, root: &Path) -> Result<RootIgnore, WatchError> {
        let gitignore = if self.use_gitignore {
            load_gitignore(root)?
        } else {
            None
        };
        Ok(RootIgnore {
            root: root.to_path_buf(),
            rules: self.rules.clone(),
            gitignore,
        })
    }
}

fn load_gitignore(root: &Path) -> Result<Option<Gitignore>, WatchError> {
    let gitignore_path = root.join(".gitignore");
    if !gitignore_path.exists() {
        return Ok(None);
    }
    let mut builder = GitignoreBuilder::new(root);
    if let Some(err) = builder.add(&gitignore_path) {
        return Err(err.into());
    }
    Ok(Some(builder.build()?))
}

/// Ignore rules bound to a specific root
#[derive(Debug, Clone)]
pub struct RootIgnore {
    root: PathBuf,
    rules: Vec<IgnoreRule>,
    gitignore: Option<Gitignore>,
}

impl RootIgnore {
    /// Check if the entry at `path` should be skipped
    ///
    /// An entry below an ignored directory is ignored too. Ancestors are
    /// checked up to, but not including, the root.
    pub fn should_ignore(&self, path: &Path, is_dir: bool) -> bool {
        if self.matches(path, is_dir) {
            return true;
        }

        if path.starts_with(&self.root) {
            let ignored_ancestor = path
                .ancestors()
                .skip(1)
                .take_while(|ancestor| *ancestor != self.root.as_path() && ancestor.starts_with(&self.root))
                .any(|ancestor| self.matches(ancestor, true));
            if ignored_ancestor {
                return true;
            }
        }

        if let Some(ref gitignore) = self.gitignore {
            // Paths outside the gitignore root cannot match it
            if path.starts_with(gitignore.path()) {
                return gitignore
                    .matched_path_or_any_parents(path, is_dir)
                    .is_ignore();
            }
        }

        false
    }

    fn matches(&self, path: &Path, is_dir: bool) -> bool {
        self.rules.iter().any(|rule| rule.matches(path, is_dir))
    }
}

/// Ignore configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreConfig {
    /// Apply the root's .gitignore (default: false)
    #[serde(default)]
    pub use_gitignore: bool,

    /// Entry names or full paths to skip
    #[serde(default)]
    pub exact: Vec<String>,

    /// Regexes matched against the full path
    #[serde(default)]
    pub patterns: Vec<String>,

    #[serde(default)]
    pub prefixes: Vec<PrefixConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixConfig {
    pub path: PathBuf,
    /// When false, only the files directly inside `path` are skipped
    #[serde(default = "default_true")]
    pub recursive: bool,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_exact_matches_name_or_full_path() {
        let rule = IgnoreRule::exact("node_modules");
        assert!(rule.matches(Path::new("root/node_modules"), false));
        assert!(rule.matches(Path::new("node_modules"), false));
        assert!(!rule.matches(Path::new("root/node_modules_old"), false));

        let rule = IgnoreRule::exact("root/a/b.ts");
        assert!(rule.matches(Path::new("root/a/b.ts"), false));
        assert!(!rule.matches(Path::new("root/b.ts"), false));
    }

    #[test]
    fn test_pattern_matches_full_path() {
        let rule = IgnoreRule::pattern(r"/test/folder/ignore($|/)").unwrap();
        assert!(rule.matches(Path::new("/w/test/folder/ignore"), false));
        assert!(rule.matches(Path::new("/w/test/folder/ignore/deep.ts"), false));
        assert!(!rule.matches(Path::new("/w/test/folder/ignored.ts"), false));
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        assert!(matches!(
            IgnoreRule::pattern("(unclosed"),
            Err(WatchError::Regex(_))
        ));
    }

    #[test]
    fn test_predicate() {
        let rule = IgnoreRule::predicate(|p| p.extension().is_some_and(|e| e == "log"));
        assert!(rule.matches(Path::new("root/debug.log"), false));
        assert!(!rule.matches(Path::new("root/debug.ts"), false));
    }

    #[test]
    fn test_prefix_recursive_and_shallow() {
        let deep = IgnoreRule::prefix("root/gen", true);
        assert!(deep.matches(Path::new("root/gen"), true));
        assert!(deep.matches(Path::new("root/gen/a/b.ts"), false));
        assert!(!deep.matches(Path::new("root/generated"), true));

        let shallow = IgnoreRule::prefix("root/gen", false);
        assert!(!shallow.matches(Path::new("root/gen"), true));
        assert!(shallow.matches(Path::new("root/gen/a.ts"), false));
        assert!(!shallow.matches(Path::new("root/gen/a"), true));
        assert!(!shallow.matches(Path::new("root/gen/a/b.ts"), false));
    }

    #[test]
    fn test_entries_below_ignored_directory_are_ignored() {
        let rules = IgnoreRules::new()
            .with_rule(IgnoreRule::exact("node_modules"))
            .with_rule(IgnoreRule::predicate(|p| p.ends_with("generated")))
            .with_rule(IgnoreRule::pattern(r"/fixtures$").unwrap());
        let resolved = rules.for_root(Path::new("root")).unwrap();

        assert!(resolved.should_ignore(Path::new("root/node_modules/pkg/new.js"), false));
        assert!(resolved.should_ignore(Path::new("root/a/node_modules/pkg"), true));
        assert!(resolved.should_ignore(Path::new("root/generated/x/y.ts"), false));
        assert!(resolved.should_ignore(Path::new("root/test/fixtures/case.ts"), false));
        assert!(!resolved.should_ignore(Path::new("root/src/pkg/new.js"), false));
    }

    #[test]
    fn test_root_itself_never_hides_its_entries() {
        let rules = IgnoreRules::new().with_rule(IgnoreRule::exact("node_modules"));
        let resolved = rules.for_root(Path::new("app/node_modules")).unwrap();

        assert!(!resolved.should_ignore(Path::new("app/node_modules/pkg/index.ts"), false));
    }

    #[test]
    fn test_shallow_prefix_keeps_subdirectories() {
        let rules = IgnoreRules::new().with_rule(IgnoreRule::prefix("root/gen", false));
        let resolved = rules.for_root(Path::new("root")).unwrap();

        assert!(resolved.should_ignore(Path::new("root/gen/out.ts"), false));
        assert!(!resolved.should_ignore(Path::new("root/gen"), true));
        assert!(!resolved.should_ignore(Path::new("root/gen/nested"), true));
        assert!(!resolved.should_ignore(Path::new("root/gen/nested/keep.ts"), false));
    }

    #[test]
    fn test_gitignore_applied_when_enabled() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(".gitignore"), "*.log\ndist/\n").unwrap();

        let rules = IgnoreRules::new().with_gitignore(true);
        let resolved = rules.for_root(temp_dir.path()).unwrap();

        assert!(resolved.should_ignore(&temp_dir.path().join("debug.log"), false));
        assert!(resolved.should_ignore(&temp_dir.path().join("dist"), true));
        assert!(resolved.should_ignore(&temp_dir.path().join("dist/index.js"), false));
        assert!(!resolved.should_ignore(&temp_dir.path().join("src/main.ts"), false));
    }

    #[test]
    fn test_gitignore_disabled_by_default() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(".gitignore"), "*.log\n").unwrap();

        let resolved = IgnoreRules::new().for_root(temp_dir.path()).unwrap();
        assert!(!resolved.should_ignore(&temp_dir.path().join("debug.log"), false));
    }

    #[test]
    fn test_from_config() {
        let config: IgnoreConfig = toml_like_config();
        let rules = IgnoreRules::from_config(&config).unwrap();
        assert_eq!(rules.len(), 3);

        let resolved = rules.for_root(Path::new("root")).unwrap();
        assert!(resolved.should_ignore(Path::new("root/.cache"), true));
        assert!(resolved.should_ignore(Path::new("root/a.test.ts"), false));
        assert!(resolved.should_ignore(Path::new("root/vendor/x/y.ts"), false));
        assert!(!resolved.should_ignore(Path::new("root/a.ts"), false));
    }

    fn toml_like_config() -> IgnoreConfig {
        IgnoreConfig {
            use_gitignore: false,
            exact: vec![".cache".to_string()],
            patterns: vec![r"\.test\.ts$".to_string()],
            prefixes: vec![PrefixConfig {
                path: PathBuf::from("root/vendor"),
                recursive: true,
            }],
        }
    }
}
