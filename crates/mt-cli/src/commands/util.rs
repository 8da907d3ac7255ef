//! Shared utilities for CLI commands.

use anyhow::Context;
use chrono::NaiveDateTime;
use mt_core::marker;

/// Parse a datetime argument.
///
/// Supports:
/// - "2025-01-15T09:30:00" (optionally with a trailing Z)
/// - "2025-01-15" (midnight)
pub fn parse_datetime(s: &str) -> anyhow::Result<NaiveDateTime> {
    marker::parse_due(s).with_context(|| {
        format!("Invalid datetime: {s}. Use 2025-01-15T09:30:00 or 2025-01-15")
    })
}

/// Replace every stored item and project ID in `output` with a placeholder.
#[cfg(test)]
pub fn redact_ids(output: &str, db: &mt_db::Database) -> String {
    let mut redacted = output.to_string();
    for item in db.list_items().unwrap() {
        redacted = redacted.replace(&item.id, "[ID]");
    }
    for project in db.list_projects().unwrap() {
        redacted = redacted.replace(&project.id, "[ID]");
    }
    redacted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_accepted_formats() {
        assert_eq!(
            parse_datetime("2025-01-15T09:30:00").unwrap().to_string(),
            "2025-01-15 09:30:00"
        );
        assert_eq!(
            parse_datetime("2025-01-15").unwrap().to_string(),
            "2025-01-15 00:00:00"
        );
    }

    #[test]
    fn rejects_other_formats() {
        let err = parse_datetime("tomorrow 9am").unwrap_err();
        assert!(err.to_string().starts_with("Invalid datetime: tomorrow 9am"));
    }
}
