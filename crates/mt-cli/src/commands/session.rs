//! Work session commands.

use std::io::Write;

use anyhow::{Result, bail};
use mt_core::{ItemId, WorkSession, marker};
use mt_db::{Database, NewItem};

use super::util::parse_datetime;

pub fn add<W: Write>(
    writer: &mut W,
    db: &mut Database,
    project: &str,
    start: &str,
    minutes: u32,
) -> Result<()> {
    if minutes == 0 {
        bail!("a work session needs at least one minute");
    }
    let start = parse_datetime(start)?;
    let project = db.project_by_name(project)?;

    let item = db.insert_item(&NewItem {
        project_id: project.id,
        parent_id: None,
        content: marker::work_session_title(minutes),
        due: Some(marker::format_due(start)),
    })?;
    let session = WorkSession::from_item(
        ItemId::new(item.id.clone())?,
        &item.content,
        item.due.as_deref().unwrap_or_default(),
    )?;

    writeln!(
        writer,
        "Added {} starting {} ({})",
        session,
        session.start.format("%Y-%m-%d %H:%M"),
        item.id
    )?;
    Ok(())
}
