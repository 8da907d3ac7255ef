//! CLI subcommand implementations.

pub mod backlog;
pub mod check;
pub mod project;
pub mod schedule;
pub mod session;
pub mod status;
pub mod task;
mod util;
