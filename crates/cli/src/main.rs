//! autoexport - keep export index files in sync with directory contents

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;

/// autoexport - Generate and maintain index.ts export files
#[derive(Parser)]
#[command(name = "autoexport")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: ./autoexport.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch directories and keep their export files up to date
    Watch {
        /// Directories to watch (overrides watch.paths)
        paths: Vec<PathBuf>,

        /// Output file name (default: index.ts)
        #[arg(short, long)]
        output: Option<String>,

        /// Debounce interval in milliseconds, 0 to write immediately
        #[arg(short, long)]
        debounce: Option<u64>,

        /// Regex of paths to ignore (repeatable)
        #[arg(short, long = "ignore", value_name = "REGEX")]
        ignore: Vec<String>,

        /// Honour .gitignore in each watched directory
        #[arg(long)]
        gitignore: bool,

        /// Generate once and exit instead of watching
        #[arg(long)]
        once: bool,
    },
    /// Show the effective configuration
    Config {
        /// Directories to watch (overrides watch.paths)
        paths: Vec<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Watch {
            paths,
            output,
            debounce,
            ignore,
            gitignore,
            once,
        } => {
            let overrides = autoexport_cli::Overrides {
                paths,
                output,
                debounce_ms: debounce,
                ignore,
                gitignore,
            };
            cmd::watch::run(cli.config.as_deref(), overrides, once).await
        }
        Commands::Config { paths } => {
            let overrides = autoexport_cli::Overrides {
                paths,
                ..Default::default()
            };
            cmd::config::run(cli.config.as_deref(), overrides)
        }
    }
}
