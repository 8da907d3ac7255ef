//! Schedule command for allocating a work session.

use std::io::Write;

use anyhow::{Context, Result};
use mt_core::{ItemId, ScheduleOptions, schedule};
use mt_db::Database;

use crate::Config;

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    config: &Config,
    namespace: Option<&str>,
    session: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    let namespace = namespace.unwrap_or(&config.namespace);
    let options = ScheduleOptions {
        session_id: session.map(ItemId::new).transpose()?,
        dry_run,
    };

    let run = schedule(db, namespace, &config.allocation(), &options)
        .with_context(|| format!("failed to schedule a work session from {namespace}"))?;
    let session = &run.allocation.session;

    writeln!(
        writer,
        "Work session: {} ({})",
        session,
        session.start.format("%Y-%m-%d %H:%M")
    )?;

    let blocks: Vec<_> = run.blocks().collect();
    if blocks.is_empty() {
        writeln!(writer, "(nothing to schedule)")?;
        return Ok(());
    }

    for block in &blocks {
        let id = block
            .external_ref
            .as_ref()
            .map_or_else(|| "unsaved".to_string(), ToString::to_string);
        writeln!(
            writer,
            "  {}  {:>3} min  {}  ({})",
            block.start.format("%Y-%m-%d %H:%M"),
            block.minutes,
            block.name,
            id
        )?;
    }

    writeln!(
        writer,
        "Allocated {} of {} minutes in {} blocks.",
        run.allocation.allocated_minutes(&run.schedulables),
        session.total_minutes,
        blocks.len()
    )?;
    match run.committed {
        Some(written) => writeln!(writer, "Committed {written} items.")?,
        None => writeln!(writer, "Dry run: nothing saved.")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use mt_core::Backend;
    use mt_db::NewItem;

    use crate::commands::util::redact_ids;

    fn config() -> Config {
        Config {
            database_path: "unused.db".into(),
            ..Config::default()
        }
    }

    fn add(db: &mut Database, project: &str, content: &str, due: &str) -> String {
        let project = db.project_by_name(project).unwrap();
        db.insert_item(&NewItem {
            project_id: project.id,
            parent_id: None,
            content: content.to_string(),
            due: Some(due.to_string()),
        })
        .unwrap()
        .id
    }

    fn fixture() -> Database {
        let mut db = Database::open_in_memory().unwrap();
        db.create_project("Life").unwrap();
        db.create_project("Work").unwrap();
        add(&mut db, "Life", "Work Time {130m}", "2025-01-15T09:00:00");
        add(&mut db, "Work", "[MT]Quarterly report{2h}", "2025-01-16");
        add(&mut db, "Work", "[MT]Taxes{60m}", "2025-01-20T12:00:00");
        db
    }

    #[test]
    fn schedule_commits_blocks() {
        let mut db = fixture();
        let mut output = Vec::new();
        run(&mut output, &mut db, &config(), None, None, false).unwrap();

        let output = redact_ids(&String::from_utf8(output).unwrap(), &db);
        assert_snapshot!(output);

        let schedulables = db.fetch_schedulables_with_history().unwrap();
        let planned: Vec<u32> = schedulables.iter().map(|s| s.planned_minutes()).collect();
        assert_eq!(planned, vec![55, 55]);
    }

    #[test]
    fn schedule_dry_run_saves_nothing() {
        let mut db = fixture();
        let mut output = Vec::new();
        run(&mut output, &mut db, &config(), None, None, true).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("(unsaved)"));
        assert!(output.ends_with("Dry run: nothing saved.\n"));
        assert_eq!(db.item_counts().unwrap().blocks, 0);
    }

    #[test]
    fn schedule_with_nothing_to_do() {
        let mut db = Database::open_in_memory().unwrap();
        db.create_project("Life").unwrap();
        add(&mut db, "Life", "Work Time {30m}", "2025-01-15T09:00:00");

        let mut output = Vec::new();
        run(&mut output, &mut db, &config(), None, None, false).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Work session: Work Time {30m} : 30 min (2025-01-15 09:00)\n(nothing to schedule)\n"
        );
    }

    #[test]
    fn schedule_picks_requested_session() {
        let mut db = fixture();
        let later = add(&mut db, "Life", "Work Time {20m}", "2025-01-16T14:00:00");

        let mut output = Vec::new();
        run(&mut output, &mut db, &config(), None, Some(&later), false).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("Work session: Work Time {20m} : 20 min (2025-01-16 14:00)\n"));
        assert!(output.contains("Allocated 20 of 20 minutes in 1 blocks."));
    }

    #[test]
    fn schedule_reports_missing_sessions() {
        let mut db = fixture();
        let mut output = Vec::new();

        let err = run(&mut output, &mut db, &config(), Some("Work"), None, false).unwrap_err();
        assert_eq!(
            format!("{err:#}"),
            "failed to schedule a work session from Work: no work session found in Work"
        );

        let err = run(&mut output, &mut db, &config(), Some("Home"), None, false).unwrap_err();
        assert_eq!(
            format!("{err:#}"),
            "failed to schedule a work session from Home: project not found: Home"
        );
        assert!(output.is_empty());
    }
}
