//! Show the effective configuration

use anyhow::Result;
use autoexport_cli::{Config, Overrides, DEFAULT_CONFIG_FILE};
use owo_colors::OwoColorize;
use std::path::Path;

pub fn run(config_path: Option<&Path>, overrides: Overrides) -> Result<()> {
    let mut config = Config::discover(config_path)?;
    config.apply(overrides);

    let source = match config_path {
        Some(path) => path.display().to_string(),
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => DEFAULT_CONFIG_FILE.to_string(),
        None => "(defaults)".to_string(),
    };

    println!("{}", "Configuration".bold());
    println!("{}: {}\n", "Location".dimmed(), source.dimmed());

    println!("{}", "[watch]".yellow());
    if config.watch.paths.is_empty() {
        println!("  {} = {}", "paths".cyan(), "[]".dimmed());
    }
    for path in &config.watch.paths {
        println!("  {} = {}", "path".cyan(), path.display());
    }

    let ignore = &config.watch.ignore;
    println!("\n{}", "[watch.ignore]".yellow());
    println!("  {} = {}", "use_gitignore".cyan(), ignore.use_gitignore);
    println!("  {} = {:?}", "exact".cyan(), ignore.exact);
    println!("  {} = {:?}", "patterns".cyan(), ignore.patterns);
    for prefix in &ignore.prefixes {
        println!(
            "  {} = {} {}",
            "prefix".cyan(),
            prefix.path.display(),
            if prefix.recursive {
                "(recursive)".dimmed().to_string()
            } else {
                "(files directly inside)".dimmed().to_string()
            }
        );
    }

    println!("\n{}", "[output]".yellow());
    println!("  {} = {:?}", "file".cyan(), config.output.file);
    println!(
        "  {} = {} {}",
        "debounce_ms".cyan(),
        config.output.debounce_ms,
        if config.output.debounce_ms == 0 {
            "(write immediately)".dimmed().to_string()
        } else {
            format!("({}ms quiet period)", config.output.debounce_ms)
                .dimmed()
                .to_string()
        }
    );

    if let Err(e) = config.validate() {
        println!("\n{} {}", "Invalid:".red(), e);
    }

    Ok(())
}
