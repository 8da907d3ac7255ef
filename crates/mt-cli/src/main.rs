use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mt_cli::commands::{backlog, check, project, schedule, session, status, task};
use mt_cli::{Cli, Commands, Config, ProjectAction, SessionAction, TaskAction};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(mt_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = mt_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so command output stays parseable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let (mut db, config) = open_database(cli.config.as_deref())?;
    let mut out = std::io::stdout().lock();

    match command {
        Commands::Status => status::run(&mut out, &db, &config.database_path)?,
        Commands::Project(action) => match action {
            ProjectAction::Add { name } => project::add(&mut out, &db, name)?,
            ProjectAction::List => project::list(&mut out, &db)?,
        },
        Commands::Session(SessionAction::Add {
            project,
            start,
            minutes,
        }) => {
            let project = project.as_deref().unwrap_or(&config.namespace);
            session::add(&mut out, &mut db, project, start, *minutes)?;
        }
        Commands::Task(TaskAction::Add {
            project,
            name,
            minutes,
            due,
        }) => task::add(&mut out, &mut db, project, name, *minutes, due)?,
        Commands::Check { item_id, undo } => check::run(&mut out, &db, item_id, *undo)?,
        Commands::Backlog { json } => backlog::run(&mut out, &mut db, config.pct_scheduled, *json)?,
        Commands::Schedule {
            session,
            namespace,
            dry_run,
        } => schedule::run(
            &mut out,
            &mut db,
            &config,
            namespace.as_deref(),
            session.as_deref(),
            *dry_run,
        )?,
    }

    Ok(())
}
