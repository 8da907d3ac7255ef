//! Schedulables and the task-work blocks allocated to them.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::error::Error;
use crate::marker;
use crate::types::{ExternalRef, ItemId, PctScheduledFormula, ProjectId};

/// A concrete, time-stamped slice of effort assigned to one schedulable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskWorkBlock {
    /// ID of the owning schedulable's item.
    pub schedulable: ItemId,

    /// Name of the owning schedulable, as written in the block title.
    pub name: String,

    /// When work on the block starts.
    pub start: NaiveDateTime,

    /// Length of the block in minutes.
    pub minutes: u32,

    /// Marked complete by an external actor.
    pub checked: bool,

    /// Store reference, set once the block has been persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ref: Option<ExternalRef>,
}

impl TaskWorkBlock {
    /// A new, unpersisted block.
    pub fn planned(owner: &Schedulable, start: NaiveDateTime, minutes: u32) -> Self {
        Self {
            schedulable: owner.id.clone(),
            name: owner.name.clone(),
            start,
            minutes,
            checked: false,
            external_ref: None,
        }
    }

    /// Rebuilds a persisted block from its store item.
    pub fn from_item(
        id: ItemId,
        parent: ItemId,
        content: &str,
        due: &str,
        checked: bool,
    ) -> Result<Self, Error> {
        let (name, minutes) = marker::parse_block_title(content)?;
        Ok(Self {
            schedulable: parent,
            name,
            start: marker::parse_due(due)?,
            minutes,
            checked,
            external_ref: Some(id),
        })
    }

    /// Title the block is stored under.
    pub fn title(&self) -> String {
        marker::block_title(&self.name, self.minutes)
    }

    /// Whether the block already exists in the store.
    pub const fn is_materialized(&self) -> bool {
        self.external_ref.is_some()
    }
}

impl fmt::Display for TaskWorkBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {}",
            self.title(),
            self.start.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

/// A unit of work with a total required duration and a due time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedulable {
    /// ID of the source item.
    pub id: ItemId,

    /// Project the source item lives in; new blocks are created there.
    pub project_id: ProjectId,

    /// Name without markers.
    pub name: String,

    /// Total effort needed, in minutes.
    pub required_minutes: u32,

    /// When the work is due.
    pub due_at: NaiveDateTime,

    /// Blocks in discovery order, followed by blocks created this run.
    #[serde(default)]
    pub blocks: Vec<TaskWorkBlock>,
}

impl Schedulable {
    /// Builds a schedulable from a `[MT]<name>{<n><unit>}` item.
    pub fn from_item(
        id: ItemId,
        project_id: ProjectId,
        content: &str,
        due: &str,
    ) -> Result<Self, Error> {
        let (name, required_minutes) = marker::parse_schedulable_title(content)?;
        Ok(Self {
            id,
            project_id,
            name,
            required_minutes,
            due_at: marker::parse_due(due)?,
            blocks: Vec::new(),
        })
    }

    /// Minutes in blocks marked complete.
    pub fn checked_minutes(&self) -> u32 {
        self.blocks
            .iter()
            .filter(|b| b.checked)
            .map(|b| b.minutes)
            .sum()
    }

    /// Minutes in blocks not yet marked complete.
    pub fn planned_minutes(&self) -> u32 {
        self.blocks
            .iter()
            .filter(|b| !b.checked)
            .map(|b| b.minutes)
            .sum()
    }

    /// Minutes still to be scheduled. Never underflows.
    pub fn remaining_minutes(&self) -> u32 {
        self.required_minutes
            .saturating_sub(self.checked_minutes())
            .saturating_sub(self.planned_minutes())
    }

    /// Fraction of the required duration that is checked.
    ///
    /// `None` when nothing is required.
    pub fn pct_complete(&self) -> Option<f64> {
        if self.required_minutes == 0 {
            return None;
        }
        Some(f64::from(self.checked_minutes()) / f64::from(self.required_minutes))
    }

    /// Fraction of the required duration that is checked or planned.
    ///
    /// `None` when nothing is required.
    pub fn pct_scheduled(&self, formula: PctScheduledFormula) -> Option<f64> {
        if self.required_minutes == 0 {
            return None;
        }
        let checked = f64::from(self.checked_minutes());
        let planned = f64::from(self.planned_minutes());
        let required = f64::from(self.required_minutes);
        Some(match formula {
            PctScheduledFormula::Historical => checked + planned / required,
            PctScheduledFormula::Proportional => (checked + planned) / required,
        })
    }

    /// Appends a block of at most `max_minutes`, capped by the remaining need.
    ///
    /// Returns the new block's index, or `None` without appending when the
    /// cap works out to zero minutes.
    pub fn create_block(&mut self, start: NaiveDateTime, max_minutes: u32) -> Option<usize> {
        let minutes = max_minutes.min(self.remaining_minutes());
        if minutes == 0 {
            return None;
        }
        let block = TaskWorkBlock::planned(self, start, minutes);
        self.blocks.push(block);
        Some(self.blocks.len() - 1)
    }

    /// Persists the block at `index` through the backend, exactly once.
    pub fn materialize_block<B: Backend + ?Sized>(
        &mut self,
        index: usize,
        backend: &mut B,
    ) -> Result<&ExternalRef, Error> {
        let Some(block) = self.blocks.get(index) else {
            return Err(Error::UnknownBlock {
                owner: self.id.to_string(),
                index,
            });
        };
        if let Some(external_ref) = &block.external_ref {
            return Err(Error::AlreadyMaterialized {
                owner: self.id.clone(),
                index,
                external_ref: external_ref.clone(),
            });
        }

        let external_ref = backend.materialize(self, block)?;
        tracing::debug!(
            owner = %self.id,
            index,
            %external_ref,
            "materialized block"
        );
        let stored = self.blocks[index].external_ref.insert(external_ref);
        Ok(&*stored)
    }
}

impl fmt::Display for Schedulable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}/{} checked, {} planned, due {})",
            self.name,
            self.checked_minutes(),
            self.required_minutes,
            self.planned_minutes(),
            self.due_at.format("%Y-%m-%d %H:%M")
        )
    }
}

/// Existing blocks grouped by the ID of the item they belong to.
#[derive(Debug, Default)]
pub struct BlockIndex {
    by_owner: HashMap<ItemId, Vec<TaskWorkBlock>>,
}

impl BlockIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a block under its owner, keeping discovery order.
    pub fn insert(&mut self, block: TaskWorkBlock) {
        self.by_owner
            .entry(block.schedulable.clone())
            .or_default()
            .push(block);
    }

    /// Moves every indexed block onto its owner.
    ///
    /// Returns the blocks whose owner is not among `schedulables`.
    pub fn attach(mut self, schedulables: &mut [Schedulable]) -> Vec<TaskWorkBlock> {
        for schedulable in schedulables.iter_mut() {
            if let Some(blocks) = self.by_owner.remove(&schedulable.id) {
                schedulable.blocks.extend(blocks);
            }
        }
        self.by_owner.into_values().flatten().collect()
    }
}

impl FromIterator<TaskWorkBlock> for BlockIndex {
    fn from_iter<I: IntoIterator<Item = TaskWorkBlock>>(iter: I) -> Self {
        let mut index = Self::new();
        for block in iter {
            index.insert(block);
        }
        index
    }
}
