//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Time-boxing scheduler.
///
/// Splits work sessions into work periods and breaks and hands each slice
/// to the task that is least scheduled.
#[derive(Debug, Parser)]
#[command(name = "mt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show database location and item counts.
    Status,

    /// Manage projects.
    #[command(subcommand)]
    Project(ProjectAction),

    /// Manage work sessions.
    #[command(subcommand)]
    Session(SessionAction),

    /// Manage schedulable tasks.
    #[command(subcommand)]
    Task(TaskAction),

    /// Mark an item (usually a task-work block) complete.
    Check {
        /// The item ID.
        item_id: String,

        /// Clear the checked flag instead.
        #[arg(long)]
        undo: bool,
    },

    /// List schedulable tasks with their progress and priority.
    Backlog {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Allocate a work session and save the new task-work blocks.
    Schedule {
        /// Work session item ID (default: the first session found).
        #[arg(long)]
        session: Option<String>,

        /// Project holding the work sessions (default: from config).
        #[arg(long)]
        namespace: Option<String>,

        /// Print the plan without saving it.
        #[arg(long)]
        dry_run: bool,
    },
}

/// Project subcommands.
#[derive(Debug, Subcommand)]
pub enum ProjectAction {
    /// Create a project.
    Add {
        /// Project name.
        name: String,
    },
    /// List projects.
    List,
}

/// Work session subcommands.
#[derive(Debug, Subcommand)]
pub enum SessionAction {
    /// Add a work session.
    Add {
        /// Project to add the session to (default: configured namespace).
        #[arg(long)]
        project: Option<String>,

        /// Start, e.g. 2025-01-15T09:00:00.
        #[arg(long)]
        start: String,

        /// Length in minutes.
        #[arg(long)]
        minutes: u32,
    },
}

/// Task subcommands.
#[derive(Debug, Subcommand)]
pub enum TaskAction {
    /// Add a schedulable task.
    Add {
        /// Project to add the task to.
        #[arg(long)]
        project: String,

        /// Task name.
        #[arg(long)]
        name: String,

        /// Total effort in minutes.
        #[arg(long)]
        minutes: u32,

        /// Due date, e.g. 2025-01-16 or 2025-01-16T17:00:00.
        #[arg(long)]
        due: String,
    },
}
