//! Sleep analysis CLI library.
//!
//! This crate provides the CLI interface, configuration, reporting and
//! chart rendering on top of `sl-core`.

pub mod charts;
mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, SourceArgs};
pub use config::{Config, Settings};
