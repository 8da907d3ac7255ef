//! Status command for showing what the database holds.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use mt_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &Database, database_path: &Path) -> Result<()> {
    let counts = db.item_counts()?;

    writeln!(writer, "Mindtime status")?;
    writeln!(writer, "Database: {}", database_path.display())?;
    writeln!(writer, "Projects: {}", counts.projects)?;
    writeln!(writer, "Work sessions: {}", counts.work_sessions)?;
    writeln!(writer, "Schedulables: {}", counts.schedulables)?;
    writeln!(
        writer,
        "Blocks: {} ({} checked)",
        counts.blocks, counts.checked_blocks
    )?;

    Ok(())
}
