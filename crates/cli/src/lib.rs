//! Shared pieces of the `autoexport` command

pub mod config;

pub use config::{Config, Overrides, DEFAULT_CONFIG_FILE};
