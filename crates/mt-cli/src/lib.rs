//! Mindtime CLI library.
//!
//! This crate provides the CLI interface for the scheduler.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, ProjectAction, SessionAction, TaskAction};
pub use config::Config;
