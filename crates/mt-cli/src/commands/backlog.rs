//! Backlog command for listing schedulables with their progress.
//!
//! This module implements `mt backlog`, which shows every open task in the
//! order the scheduler would give it time.

use std::cmp::Ordering;
use std::fmt::Write;

use anyhow::Result;
use chrono::NaiveDateTime;
use mt_core::{Backend, PctScheduledFormula, PriorityKey, Schedulable, priority};
use mt_db::Database;
use serde::Serialize;

/// Backlog row for display.
#[derive(Debug, Clone, Serialize)]
pub struct BacklogEntry {
    pub id: String,
    pub name: String,
    pub required_minutes: u32,
    pub checked_minutes: u32,
    pub planned_minutes: u32,
    pub due_at: NaiveDateTime,
    /// `None` once the task is fully scheduled.
    pub priority: Option<PriorityKey>,
}

impl BacklogEntry {
    fn new(schedulable: &Schedulable, formula: PctScheduledFormula) -> Self {
        Self {
            id: schedulable.id.to_string(),
            name: schedulable.name.clone(),
            required_minutes: schedulable.required_minutes,
            checked_minutes: schedulable.checked_minutes(),
            planned_minutes: schedulable.planned_minutes(),
            due_at: schedulable.due_at,
            priority: priority(schedulable, formula),
        }
    }
}

/// Loads the backlog, most urgent first; fully scheduled tasks go last.
pub fn get_backlog(db: &mut Database, formula: PctScheduledFormula) -> Result<Vec<BacklogEntry>> {
    let mut entries: Vec<BacklogEntry> = db
        .fetch_schedulables_with_history()?
        .iter()
        .map(|s| BacklogEntry::new(s, formula))
        .collect();

    entries.sort_by(|a, b| match (&a.priority, &b.priority) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    Ok(entries)
}

/// Format the backlog for human-readable output.
pub fn format_backlog(entries: &[BacklogEntry], formula: PctScheduledFormula) -> String {
    let mut output = String::new();

    writeln!(output, "BACKLOG ({formula})").unwrap();
    writeln!(output).unwrap();

    if entries.is_empty() {
        writeln!(output, "No open tasks.").unwrap();
        return output;
    }

    writeln!(
        output,
        "{:<22}  {:>7}  {:>7}  {:>8}  {:<16}  Priority",
        "Name", "Checked", "Planned", "Required", "Due"
    )
    .unwrap();
    writeln!(
        output,
        "──────────────────────  ───────  ───────  ────────  ────────────────  ───────────"
    )
    .unwrap();

    for entry in entries {
        // Truncate by characters, not bytes, to avoid panics on multi-byte UTF-8
        let name = if entry.name.chars().count() > 22 {
            format!("{}...", entry.name.chars().take(19).collect::<String>())
        } else {
            entry.name.clone()
        };
        let priority = entry.priority.map_or_else(
            || "scheduled".to_string(),
            |key| format!("{:.2} / {:.2}", key.pct_scheduled, key.pct_complete),
        );

        writeln!(
            output,
            "{:<22}  {:>7}  {:>7}  {:>8}  {:<16}  {}",
            name,
            entry.checked_minutes,
            entry.planned_minutes,
            entry.required_minutes,
            entry.due_at.format("%Y-%m-%d %H:%M"),
            priority
        )
        .unwrap();
    }

    output
}

pub fn run<W: std::io::Write>(
    writer: &mut W,
    db: &mut Database,
    formula: PctScheduledFormula,
    json: bool,
) -> Result<()> {
    let entries = get_backlog(db, formula)?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&entries)?)?;
    } else {
        write!(writer, "{}", format_backlog(&entries, formula))?;
    }
    Ok(())
}
