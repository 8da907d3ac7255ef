//! Storage layer for the mindtime scheduler.
//!
//! A local task store using `rusqlite`, shaped like a task-tracking
//! service: projects hold items, items may have a parent item, and every
//! item is free text plus an optional due datetime and a checked flag.
//! Roles and durations live in the item titles (see [`mt_core::marker`]).
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A scheduling run takes the database by `&mut` for its whole duration.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Due datetimes are stored as TEXT in `YYYY-MM-DDThh:mm:ss` format, naive
//! local time. Dates without a time (`YYYY-MM-DD`) and a trailing `Z` are
//! accepted when reading.
//!
//! ## Ordering
//!
//! Items carry a `position` assigned on insert. Listings follow it, so
//! "the first work session" is the one inserted first.

use std::path::Path;

use mt_core::marker;
use mt_core::{
    Backend, BlockIndex, Error, ExternalRef, ItemId, ProjectId, Schedulable, TaskWorkBlock,
    ValidationError, WorkSession,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;
use uuid::Uuid;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored ID failed validation.
    #[error("invalid stored value: {0}")]
    Invalid(#[from] ValidationError),
    /// No project has the requested name.
    #[error("project not found: {0}")]
    ProjectNotFound(String),
    /// Several projects have the requested name.
    #[error("two projects with the same name: {0}")]
    AmbiguousProject(String),
}

impl From<DbError> for Error {
    fn from(err: DbError) -> Self {
        match err {
            DbError::ProjectNotFound(name) => Self::NotFound(name),
            DbError::AmbiguousProject(name) => Self::AmbiguousNamespace(name),
            other => Self::storage(other),
        }
    }
}

/// Database connection wrapper.
///
/// Also the scheduler's [`Backend`]: materialized blocks are queued in
/// memory and written by [`Backend::commit`] in a single transaction.
pub struct Database {
    conn: Connection,
    pending: Vec<ItemRecord>,
}

/// A project (namespace) stored in the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRecord {
    pub id: String,
    pub name: String,
}

/// An item stored in the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    pub id: String,
    pub project_id: String,
    pub parent_id: Option<String>,
    pub content: String,
    pub due: Option<String>,
    pub checked: bool,
}

/// An item to insert; the ID is generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub project_id: String,
    pub parent_id: Option<String>,
    pub content: String,
    pub due: Option<String>,
}

/// Item totals by role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemCounts {
    pub projects: usize,
    pub work_sessions: usize,
    pub schedulables: usize,
    pub blocks: usize,
    pub checked_blocks: usize,
}

impl ItemRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            project_id: row.get(1)?,
            parent_id: row.get(2)?,
            content: row.get(3)?,
            due: row.get(4)?,
            checked: row.get(5)?,
        })
    }

    fn due_str(&self) -> &str {
        self.due.as_deref().unwrap_or_default()
    }
}

const ITEM_COLUMNS: &str = "id, project_id, parent_id, content, due, checked";

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn,
            pending: Vec::new(),
        };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn,
            pending: Vec::new(),
        };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_projects_name ON projects(name);

            -- Items table: everything the scheduler reads or writes
            -- content: title carrying role and duration markers
            -- due: 'YYYY-MM-DDThh:mm:ss' naive local time
            CREATE TABLE IF NOT EXISTS items (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                parent_id TEXT,
                content TEXT NOT NULL,
                due TEXT,
                checked INTEGER NOT NULL DEFAULT 0,
                position INTEGER NOT NULL,
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE,
                FOREIGN KEY (parent_id) REFERENCES items(id) ON DELETE SET NULL
            );

            CREATE INDEX IF NOT EXISTS idx_items_project ON items(project_id);
            CREATE INDEX IF NOT EXISTS idx_items_parent ON items(parent_id);
            CREATE INDEX IF NOT EXISTS idx_items_position ON items(position);
            ",
        )?;
        Ok(())
    }

    /// Creates a project with a fresh ID.
    ///
    /// Names are not unique; lookups by name reject duplicates instead.
    pub fn create_project(&self, name: &str) -> Result<ProjectRecord, DbError> {
        let project = ProjectRecord {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
        };
        self.conn.execute(
            "INSERT INTO projects (id, name) VALUES (?, ?)",
            params![project.id, project.name],
        )?;
        Ok(project)
    }

    /// Lists all projects ordered by name then ID.
    pub fn list_projects(&self) -> Result<Vec<ProjectRecord>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM projects ORDER BY name ASC, id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(ProjectRecord {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        let mut projects = Vec::new();
        for row in rows {
            projects.push(row?);
        }
        Ok(projects)
    }

    /// Finds the single project called `name`.
    pub fn project_by_name(&self, name: &str) -> Result<ProjectRecord, DbError> {
        let mut matches: Vec<ProjectRecord> = self
            .list_projects()?
            .into_iter()
            .filter(|p| p.name == name)
            .collect();
        match matches.len() {
            0 => Err(DbError::ProjectNotFound(name.to_string())),
            1 => Ok(matches.remove(0)),
            _ => Err(DbError::AmbiguousProject(name.to_string())),
        }
    }

    /// Inserts an item with a fresh ID at the end of the item order.
    pub fn insert_item(&mut self, item: &NewItem) -> Result<ItemRecord, DbError> {
        let record = ItemRecord {
            id: Uuid::new_v4().to_string(),
            project_id: item.project_id.clone(),
            parent_id: item.parent_id.clone(),
            content: item.content.clone(),
            due: item.due.clone(),
            checked: false,
        };
        self.insert_items(std::slice::from_ref(&record))?;
        Ok(record)
    }

    /// Inserts a batch of items in one transaction.
    ///
    /// Either every item is written or none is.
    pub fn insert_items(&mut self, items: &[ItemRecord]) -> Result<usize, DbError> {
        if items.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO items (id, project_id, parent_id, content, due, checked, position)
                VALUES (?, ?, ?, ?, ?, ?, (SELECT COALESCE(MAX(position), 0) + 1 FROM items))
                ",
            )?;
            for item in items {
                inserted += stmt.execute(params![
                    item.id,
                    item.project_id,
                    item.parent_id,
                    item.content,
                    item.due,
                    item.checked,
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    /// Lists all items in insertion order.
    pub fn list_items(&self) -> Result<Vec<ItemRecord>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ITEM_COLUMNS} FROM items ORDER BY position ASC"
        ))?;
        let rows = stmt.query_map([], ItemRecord::from_row)?;
        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    /// Lists the items of one project in insertion order.
    pub fn list_project_items(&self, project_id: &str) -> Result<Vec<ItemRecord>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE project_id = ? ORDER BY position ASC"
        ))?;
        let rows = stmt.query_map([project_id], ItemRecord::from_row)?;
        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    /// Fetches a single item.
    pub fn get_item(&self, id: &str) -> Result<Option<ItemRecord>, DbError> {
        let item = self
            .conn
            .query_row(
                &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?"),
                [id],
                ItemRecord::from_row,
            )
            .optional()?;
        Ok(item)
    }

    /// Sets an item's checked flag. Returns whether the item exists.
    pub fn set_checked(&self, id: &str, checked: bool) -> Result<bool, DbError> {
        let updated = self.conn.execute(
            "UPDATE items SET checked = ? WHERE id = ?",
            params![checked, id],
        )?;
        Ok(updated > 0)
    }

    /// Counts projects and items by role.
    pub fn item_counts(&self) -> Result<ItemCounts, DbError> {
        let mut counts = ItemCounts {
            projects: self.list_projects()?.len(),
            ..ItemCounts::default()
        };
        for item in self.list_items()? {
            if marker::is_schedulable(&item.content) {
                counts.schedulables += 1;
            } else if marker::is_block(&item.content) {
                counts.blocks += 1;
                if item.checked {
                    counts.checked_blocks += 1;
                }
            } else if marker::is_work_session(&item.content) {
                counts.work_sessions += 1;
            }
        }
        Ok(counts)
    }

    /// Number of materialized blocks waiting for a commit.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

/// Logs and drops items that cannot be parsed; propagates everything else.
fn keep_parsed<T>(item: &ItemRecord, parsed: Result<T, Error>) -> Result<Option<T>, Error> {
    match parsed {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_item_level() => {
            tracing::warn!(item = %item.id, error = %err, "skipping unparseable item");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

impl Backend for Database {
    /// Only unchecked items count; a checked work session is over.
    fn fetch_work_sessions(&mut self, namespace: &str) -> Result<Vec<WorkSession>, Error> {
        let project = self.project_by_name(namespace)?;
        let mut sessions = Vec::new();
        for item in self.list_project_items(&project.id)? {
            if item.checked || !marker::is_work_session(&item.content) {
                continue;
            }
            let id = ItemId::new(item.id.clone()).map_err(DbError::from)?;
            let parsed = WorkSession::from_item(id, &item.content, item.due_str());
            if let Some(session) = keep_parsed(&item, parsed)? {
                sessions.push(session);
            }
        }
        Ok(sessions)
    }

    /// Unchecked schedulables from every project, with all their blocks.
    ///
    /// Starts a new run: anything still queued by an abandoned one is dropped.
    fn fetch_schedulables_with_history(&mut self) -> Result<Vec<Schedulable>, Error> {
        if !self.pending.is_empty() {
            tracing::warn!(dropped = self.pending.len(), "discarding uncommitted blocks");
            self.pending.clear();
        }
        let mut schedulables = Vec::new();
        let mut index = BlockIndex::new();

        for item in self.list_items()? {
            let id = ItemId::new(item.id.clone()).map_err(DbError::from)?;
            if marker::is_schedulable(&item.content) {
                if item.checked {
                    continue;
                }
                let project = ProjectId::new(item.project_id.clone()).map_err(DbError::from)?;
                let parsed = Schedulable::from_item(id, project, &item.content, item.due_str());
                if let Some(schedulable) = keep_parsed(&item, parsed)? {
                    schedulables.push(schedulable);
                }
            } else if marker::is_block(&item.content) {
                let Some(parent) = item.parent_id.clone() else {
                    tracing::warn!(item = %item.id, "skipping block without a parent");
                    continue;
                };
                let parent = ItemId::new(parent).map_err(DbError::from)?;
                let parsed =
                    TaskWorkBlock::from_item(id, parent, &item.content, item.due_str(), item.checked);
                if let Some(block) = keep_parsed(&item, parsed)? {
                    index.insert(block);
                }
            }
        }

        let orphans = index.attach(&mut schedulables);
        if !orphans.is_empty() {
            tracing::debug!(count = orphans.len(), "blocks without an open schedulable");
        }
        Ok(schedulables)
    }

    fn materialize(
        &mut self,
        owner: &Schedulable,
        block: &TaskWorkBlock,
    ) -> Result<ExternalRef, Error> {
        if let Some(external_ref) = &block.external_ref {
            return Err(Error::AlreadyMaterialized {
                owner: owner.id.clone(),
                index: owner
                    .blocks
                    .iter()
                    .position(|b| b == block)
                    .unwrap_or(owner.blocks.len()),
                external_ref: external_ref.clone(),
            });
        }
        let id = Uuid::new_v4().to_string();
        let external_ref = ItemId::new(id.clone()).map_err(DbError::from)?;
        self.pending.push(ItemRecord {
            id,
            project_id: owner.project_id.to_string(),
            parent_id: Some(owner.id.to_string()),
            content: block.title(),
            due: Some(marker::format_due(block.start)),
            checked: false,
        });
        Ok(external_ref)
    }

    /// On failure nothing is written and the queue is discarded.
    fn commit(&mut self) -> Result<usize, Error> {
        let pending = std::mem::take(&mut self.pending);
        match self.insert_items(&pending) {
            Ok(written) => {
                tracing::debug!(written, "committed pending items");
                Ok(written)
            }
            Err(err) => {
                tracing::warn!(dropped = pending.len(), error = %err, "commit failed");
                Err(err.into())
            }
        }
    }
}
