//! Configuration file and command-line overrides
//!
//! ```toml
//! [watch]
//! paths = ["src/components", "src/pages"]
//!
//! [watch.ignore]
//! use_gitignore = true
//! exact = ["node_modules"]
//! patterns = ['\.test\.tsx?$']
//!
//! [output]
//! file = "index.ts"
//! debounce_ms = 100
//! ```
//!
//! Relative paths are resolved against the working directory.

use anyhow::{Context, Result};
use autoexport_projection::{ProjectionOptions, DEFAULT_DEBOUNCE, DEFAULT_OUTPUT};
use autoexport_watcher::{IgnoreConfig, IgnoreRules};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "autoexport.toml";

/// Upper bound for `output.debounce_ms`
pub const MAX_DEBOUNCE_MS: u64 = 60_000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub watch: WatchConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Directories to watch
    pub paths: Vec<PathBuf>,
    pub ignore: IgnoreConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Artifact file name inside each directory
    pub file: String,
    /// Quiet period before writing; 0 writes immediately
    pub debounce_ms: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file: DEFAULT_OUTPUT.to_string(),
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
        }
    }
}

/// Values given on the command line; they win over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub paths: Vec<PathBuf>,
    pub output: Option<String>,
    pub debounce_ms: Option<u64>,
    /// Extra regex ignore patterns, appended to the file's
    pub ignore: Vec<String>,
    pub gitignore: bool,
}

impl Config {
    /// Parse a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Load `explicit` if given, otherwise the default file if present
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if !overrides.paths.is_empty() {
            self.watch.paths = overrides.paths;
        }
        if let Some(file) = overrides.output {
            self.output.file = file;
        }
        if let Some(debounce_ms) = overrides.debounce_ms {
            self.output.debounce_ms = debounce_ms;
        }
        self.watch.ignore.patterns.extend(overrides.ignore);
        if overrides.gitignore {
            self.watch.ignore.use_gitignore = true;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.watch.paths.is_empty() {
            anyhow::bail!("No paths to watch (pass them as arguments or set watch.paths)");
        }
        if let Some(empty) = self.watch.paths.iter().find(|p| p.as_os_str().is_empty()) {
            anyhow::bail!("Invalid watch path: {:?}", empty);
        }

        let file = &self.output.file;
        if file.is_empty() {
            anyhow::bail!("output.file must not be empty");
        }
        if file.contains('/') || file.contains('\\') || file == "." || file == ".." {
            anyhow::bail!("output.file must be a plain file name, got {:?}", file);
        }

        if self.output.debounce_ms > MAX_DEBOUNCE_MS {
            anyhow::bail!(
                "output.debounce_ms must be at most {} (got {})",
                MAX_DEBOUNCE_MS,
                self.output.debounce_ms
            );
        }

        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.output.debounce_ms)
    }

    /// Projection options for a session using the default writer
    pub fn projection_options(&self) -> Result<ProjectionOptions> {
        let ignore = IgnoreRules::from_config(&self.watch.ignore).context("Invalid ignore rules")?;
        Ok(ProjectionOptions::new(self.watch.paths.iter().cloned())
            .with_ignore(ignore)
            .with_output(self.output.file.clone())
            .with_debounce(self.debounce()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.output.file, "index.ts");
        assert_eq!(config.output.debounce_ms, 100);
        assert!(!config.watch.ignore.use_gitignore);
    }

    #[test]
    fn test_load_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("autoexport.toml");
        fs::write(
            &path,
            r#"
[watch]
paths = ["src/components"]

[watch.ignore]
exact = ["node_modules"]
patterns = ['\.test\.ts$']
prefixes = [{ path = "src/components/legacy" }]

[output]
debounce_ms = 0
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.watch.paths, vec![PathBuf::from("src/components")]);
        assert_eq!(config.watch.ignore.exact, vec!["node_modules".to_string()]);
        assert!(config.watch.ignore.prefixes[0].recursive);
        assert_eq!(config.output.file, "index.ts");
        assert_eq!(config.debounce(), Duration::ZERO);
    }

    #[test]
    fn test_load_reports_bad_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.toml");
        fs::write(&path, "[output\nfile = 1").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_overrides_win() {
        let mut config = Config::default();
        config.watch.paths = vec![PathBuf::from("a")];
        config.watch.ignore.patterns = vec!["x".to_string()];

        config.apply(Overrides {
            paths: vec![PathBuf::from("b"), PathBuf::from("c")],
            output: Some("exports.ts".to_string()),
            debounce_ms: Some(250),
            ignore: vec!["y".to_string()],
            gitignore: true,
        });

        assert_eq!(config.watch.paths, vec![PathBuf::from("b"), PathBuf::from("c")]);
        assert_eq!(config.output.file, "exports.ts");
        assert_eq!(config.output.debounce_ms, 250);
        assert_eq!(config.watch.ignore.patterns, vec!["x".to_string(), "y".to_string()]);
        assert!(config.watch.ignore.use_gitignore);
    }

    #[test]
    fn test_empty_overrides_keep_file_values() {
        let mut config = Config::default();
        config.watch.paths = vec![PathBuf::from("a")];
        config.apply(Overrides::default());
        assert_eq!(config.watch.paths, vec![PathBuf::from("a")]);
        assert_eq!(config.output, OutputConfig::default());
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_err(), "no paths");

        config.watch.paths = vec![PathBuf::from("src")];
        assert!(config.validate().is_ok());

        config.output.file = "nested/index.ts".to_string();
        assert!(config.validate().is_err());

        config.output.file = String::new();
        assert!(config.validate().is_err());

        config.output.file = "index.ts".to_string();
        config.output.debounce_ms = MAX_DEBOUNCE_MS + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_ignore_pattern() {
        let mut config = Config::default();
        config.watch.paths = vec![PathBuf::from("src")];
        config.watch.ignore.patterns = vec!["(".to_string()];
        assert!(config.projection_options().is_err());
    }
}
