//! Task commands.

use std::io::Write;

use anyhow::{Result, bail};
use mt_core::marker;
use mt_db::{Database, NewItem};

use super::util::parse_datetime;

pub fn add<W: Write>(
    writer: &mut W,
    db: &mut Database,
    project: &str,
    name: &str,
    minutes: u32,
    due: &str,
) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        bail!("task name cannot be empty");
    }
    if minutes == 0 {
        bail!("a task needs at least one minute");
    }
    let due = parse_datetime(due)?;
    let project = db.project_by_name(project)?;

    let item = db.insert_item(&NewItem {
        project_id: project.id,
        parent_id: None,
        content: marker::schedulable_title(name, minutes),
        due: Some(marker::format_due(due)),
    })?;

    writeln!(
        writer,
        "Added {} due {} ({})",
        item.content,
        due.format("%Y-%m-%d %H:%M"),
        item.id
    )?;
    Ok(())
}
