//! Work sessions: calendar time set aside for scheduled work.

use std::fmt;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::marker;
use crate::types::ItemId;

/// A period of time set aside for work.
///
/// Built once from a store item at the start of a run; never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkSession {
    /// ID of the source item.
    pub id: ItemId,

    /// Title of the source item.
    pub content: String,

    /// When the session begins.
    pub start: NaiveDateTime,

    /// Length of the session in minutes.
    pub total_minutes: u32,
}

impl WorkSession {
    /// Builds a session from a `Work Time {<n>m}` item.
    pub fn from_item(id: ItemId, content: &str, due: &str) -> Result<Self, Error> {
        Ok(Self {
            id,
            content: content.to_string(),
            start: marker::parse_due(due)?,
            total_minutes: marker::parse_session_minutes(content)?,
        })
    }

    /// The instant `minutes` into the session.
    pub fn offset(&self, minutes: u32) -> NaiveDateTime {
        self.start + Duration::minutes(i64::from(minutes))
    }

    /// When the session ends.
    pub fn end(&self) -> NaiveDateTime {
        self.offset(self.total_minutes)
    }
}

impl fmt::Display for WorkSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {} min", self.content, self.total_minutes)
    }
}
