//! Check command for marking items complete.

use std::io::Write;

use anyhow::{Result, bail};
use mt_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &Database, item_id: &str, undo: bool) -> Result<()> {
    if !db.set_checked(item_id, !undo)? {
        bail!("item not found: {item_id}");
    }
    if undo {
        writeln!(writer, "Unchecked {item_id}")?;
    } else {
        writeln!(writer, "Checked {item_id}")?;
    }
    Ok(())
}
