//! Scheduling errors.

use thiserror::Error;

use crate::types::{ExternalRef, ItemId};

/// Boxed error produced by a storage backend.
pub type StorageError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while loading, allocating or persisting scheduling entities.
#[derive(Debug, Error)]
pub enum Error {
    /// A duration or role marker in an item title is malformed.
    #[error("cannot parse {what} from {content:?}")]
    Parse { what: &'static str, content: String },

    /// A due date matches none of the accepted formats.
    #[error("invalid due date: {0}")]
    InvalidDueDate(String),

    /// More than one namespace carries the requested name.
    #[error("two projects with the same name: {0}")]
    AmbiguousNamespace(String),

    /// No namespace carries the requested name.
    #[error("project not found: {0}")]
    NotFound(String),

    /// The namespace exists but holds no work session.
    #[error("no work session found in {0}")]
    NoWorkSession(String),

    /// A block that already has an external reference was offered again.
    #[error("block of {owner} at index {index} is already materialized as {external_ref}")]
    AlreadyMaterialized {
        owner: ItemId,
        index: usize,
        external_ref: ExternalRef,
    },

    /// A block handle does not point at a block of the given schedulables.
    #[error("no block at index {index} of {owner}")]
    UnknownBlock { owner: String, index: usize },

    /// The storage backend failed.
    #[error("storage error")]
    Storage(#[source] StorageError),
}

impl Error {
    /// Wraps a backend error.
    pub fn storage(err: impl Into<StorageError>) -> Self {
        Self::Storage(err.into())
    }

    /// Whether the error only affects the single item being parsed.
    ///
    /// Item-level failures exclude the item from the run; everything else
    /// aborts the run.
    pub const fn is_item_level(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::InvalidDueDate(_))
    }
}
