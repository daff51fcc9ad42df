//! Watch directories and maintain their export files

use anyhow::{Context, Result};
use autoexport_cli::{Config, Overrides};
use owo_colors::OwoColorize;
use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;
use tokio::task::LocalSet;

/// Extra quiet time past the debounce interval before `--once` exits
const SETTLE_MARGIN: Duration = Duration::from_millis(250);

pub async fn run(config_path: Option<&Path>, overrides: Overrides, once: bool) -> Result<()> {
    let mut config = Config::discover(config_path)?;
    config.apply(overrides);
    config.validate().context("Invalid configuration")?;

    // Debounce timers are local tasks
    LocalSet::new().run_until(watch(config, once)).await
}

async fn watch(config: Config, once: bool) -> Result<()> {
    let failed_writes = Rc::new(Cell::new(0usize));
    let failures = Rc::clone(&failed_writes);

    let options = config
        .projection_options()?
        .on_ready(|root| {
            println!(
                "{} {}",
                "Ready".green(),
                root.context().fullpath.display().dimmed()
            );
        })
        .on_write_error(move |e| {
            failures.set(failures.get() + 1);
            eprintln!("{} {}", "Write failed:".red(), e);
        });

    let mut session = autoexport_projection::create(options).context("Failed to start watching")?;

    if once {
        session.wait_ready().await;
        session.settle(config.debounce() + SETTLE_MARGIN).await;
        session.stop();
        if failed_writes.get() > 0 {
            anyhow::bail!("{} export file(s) could not be written", failed_writes.get());
        }
        println!("{}", "Export files up to date ✓".green());
        return Ok(());
    }

    println!("{}", "Watching".bold());
    for path in &config.watch.paths {
        println!("  {}", path.display().cyan());
    }
    println!("{}", "Press Ctrl-C to stop".dimmed());

    tokio::select! {
        _ = session.run() => {}
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            println!("\n{}", "Stopping".yellow());
        }
    }

    session.stop();
    Ok(())
}
