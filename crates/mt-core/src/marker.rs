//! Title markers and due-date text.
//!
//! The task store keeps everything as free text, so an item's role and its
//! duration are encoded in its title:
//!
//! - `[MT]Write report{2h}`: a schedulable needing two hours.
//! - `[ST]Write report{55m} [55m]`: a task-work block of 55 minutes.
//! - `Work Time {130m}`: a work session of 130 minutes.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

use crate::error::Error;

/// Title prefix of a schedulable item.
pub const SCHEDULABLE_MARK: &str = "[MT]";

/// Title prefix of a task-work block item.
pub const BLOCK_MARK: &str = "[ST]";

/// Text identifying a work session item.
pub const WORK_SESSION_MARK: &str = "Work Time";

/// Canonical storage format for datetimes.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

static SCHEDULABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[MT\](?P<name>.*)\{(?P<n>\d+)(?P<unit>[mh])\}$").unwrap()
});

static SESSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(?P<n>\d+)[[:alpha:]]\}\s*$").unwrap());

/// Whether the title marks a schedulable.
pub fn is_schedulable(content: &str) -> bool {
    content.starts_with(SCHEDULABLE_MARK)
}

/// Whether the title marks a task-work block.
pub fn is_block(content: &str) -> bool {
    content.starts_with(BLOCK_MARK)
}

/// Whether the title marks a work session.
pub fn is_work_session(content: &str) -> bool {
    content.contains(WORK_SESSION_MARK)
}

fn unit_multiplier(unit: &str) -> u32 {
    if unit == "h" { 60 } else { 1 }
}

fn parse_minutes(what: &'static str, content: &str, n: &str, unit: &str) -> Result<u32, Error> {
    n.parse::<u32>()
        .ok()
        .and_then(|n| n.checked_mul(unit_multiplier(unit)))
        .ok_or_else(|| Error::Parse {
            what,
            content: content.to_string(),
        })
}

/// Parses `[MT]<name>{<n><unit>}` into the name and the required minutes.
pub fn parse_schedulable_title(content: &str) -> Result<(String, u32), Error> {
    let caps = SCHEDULABLE_RE.captures(content).ok_or_else(|| Error::Parse {
        what: "schedulable marker",
        content: content.to_string(),
    })?;
    let minutes = parse_minutes("schedulable duration", content, &caps["n"], &caps["unit"])?;
    Ok((caps["name"].to_string(), minutes))
}

/// Parses `[ST]<name>{<n><unit>} [<n><unit>]` into the name and the block minutes.
///
/// The number comes from the last `{...}` group with its final character
/// dropped. The unit is the second-to-last character of the whole title,
/// so for the usual titles it is read from the `[..]` suffix.
pub fn parse_block_title(content: &str) -> Result<(String, u32), Error> {
    let malformed = || Error::Parse {
        what: "block marker",
        content: content.to_string(),
    };
    let rest = content.strip_prefix(BLOCK_MARK).ok_or_else(malformed)?;
    let open = rest.rfind('{').ok_or_else(malformed)?;
    let close = rest[open..].find('}').map(|i| open + i).ok_or_else(malformed)?;

    let inner = &rest[open + 1..close];
    let n = inner
        .char_indices()
        .last()
        .map(|(i, _)| &inner[..i])
        .ok_or_else(malformed)?;
    let unit = content.chars().rev().nth(1).ok_or_else(malformed)?;
    if !matches!(unit, 'm' | 'h') || n.is_empty() || !n.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }

    let mut buf = [0; 4];
    let minutes = parse_minutes("block duration", content, n, unit.encode_utf8(&mut buf))?;
    Ok((rest[..open].to_string(), minutes))
}

/// Parses the trailing `{<n><unit>}` of a work session title.
///
/// The number is taken as minutes whatever the unit letter is.
pub fn parse_session_minutes(content: &str) -> Result<u32, Error> {
    SESSION_RE
        .captures(content)
        .and_then(|caps| caps["n"].parse().ok())
        .ok_or_else(|| Error::Parse {
            what: "work session duration",
            content: content.to_string(),
        })
}

/// Title for a new task-work block.
pub fn block_title(name: &str, minutes: u32) -> String {
    format!("{BLOCK_MARK}{name}{{{minutes}m}} [{minutes}m]")
}

/// Title for a new schedulable.
pub fn schedulable_title(name: &str, minutes: u32) -> String {
    format!("{SCHEDULABLE_MARK}{name}{{{minutes}m}}")
}

/// Title for a new work session.
pub fn work_session_title(minutes: u32) -> String {
    format!("{WORK_SESSION_MARK} {{{minutes}m}}")
}

/// Parses a due date.
///
/// Accepts `YYYY-MM-DDThh:mm:ss`, `YYYY-MM-DDThh:mm:ssZ` and `YYYY-MM-DD`
/// (midnight). The trailing `Z` is ignored: all datetimes are naive local
/// time.
pub fn parse_due(s: &str) -> Result<NaiveDateTime, Error> {
    for fmt in [DATETIME_FORMAT, "%Y-%m-%dT%H:%M:%SZ"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|_| Error::InvalidDueDate(s.to_string()))
}

/// Formats a datetime the way the store keeps it.
pub fn format_due(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}
