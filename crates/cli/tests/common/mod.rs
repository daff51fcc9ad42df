//! Helpers for running the `autoexport` binary

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{Duration, Instant};

/// `autoexport` invocation with timing
pub struct AutoexportCommand {
    working_dir: PathBuf,
    args: Vec<String>,
}

/// Finished invocation
pub struct CommandResult {
    pub output: Output,
    pub duration: Duration,
}

impl AutoexportCommand {
    pub fn new(working_dir: impl AsRef<Path>) -> Self {
        Self {
            working_dir: working_dir.as_ref().to_path_buf(),
            args: Vec::new(),
        }
    }

    pub fn args(&mut self, args: &[&str]) -> &mut Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn execute(&self) -> CommandResult {
        let start = Instant::now();
        let output = Command::new(env!("CARGO_BIN_EXE_autoexport"))
            .args(&self.args)
            .current_dir(&self.working_dir)
            .env("RUST_LOG", "warn")
            .output()
            .expect("failed to run autoexport");
        CommandResult {
            output,
            duration: start.elapsed(),
        }
    }
}

impl CommandResult {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn assert_success(&self) -> &Self {
        assert!(
            self.output.status.success(),
            "autoexport failed after {:?}\nstdout:\n{}\nstderr:\n{}",
            self.duration,
            self.stdout(),
            self.stderr()
        );
        self
    }

    pub fn assert_failure(&self) -> &Self {
        assert!(
            !self.output.status.success(),
            "autoexport unexpectedly succeeded\nstdout:\n{}",
            self.stdout()
        );
        self
    }
}
