//! Work-session allocation.
//!
//! Slices a work session into work periods separated by breaks and hands
//! each slice to the most urgent schedulable.
//!
//! # Algorithm Summary
//!
//! 1. Put every schedulable with a defined priority into a min-first backlog
//! 2. Fill work periods (55 minutes by default) by repeatedly popping the
//!    most urgent schedulable and giving it as much of the period as it still
//!    needs, pushing it back with a freshly computed key
//! 3. Charge a break (15 minutes by default) after every work period
//! 4. Stop once the session is used up or nothing in the backlog needs time

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::backend::Backend;
use crate::error::Error;
use crate::priority::{PriorityKey, priority};
use crate::schedulable::{Schedulable, TaskWorkBlock};
use crate::session::WorkSession;
use crate::types::PctScheduledFormula;

/// Configuration for session allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationConfig {
    /// Length of a work period before a break is due.
    /// Default: 55 minutes.
    pub work_period_minutes: u32,

    /// Break charged after every work period.
    /// Default: 15 minutes.
    pub break_period_minutes: u32,

    /// Arithmetic for the scheduled fraction in priority keys.
    pub pct_scheduled: PctScheduledFormula,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            work_period_minutes: 55,
            break_period_minutes: 15,
            pct_scheduled: PctScheduledFormula::Historical,
        }
    }
}

/// Position of a block created by [`allocate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHandle {
    /// Index of the owner in the slice passed to [`allocate`].
    pub schedulable: usize,
    /// Index of the block in the owner's block list.
    pub block: usize,
}

/// Result of one allocation pass.
#[derive(Debug, Clone)]
pub struct Allocation {
    /// The session that was allocated.
    pub session: WorkSession,

    /// New blocks in creation order.
    pub created: Vec<BlockHandle>,
}

impl Allocation {
    /// The created blocks, resolved against the allocated schedulables.
    pub fn blocks<'a>(
        &'a self,
        schedulables: &'a [Schedulable],
    ) -> impl Iterator<Item = (&'a Schedulable, &'a TaskWorkBlock)> + 'a {
        self.created.iter().filter_map(move |handle| {
            let owner = schedulables.get(handle.schedulable)?;
            Some((owner, owner.blocks.get(handle.block)?))
        })
    }

    /// Total minutes handed out by this pass.
    pub fn allocated_minutes(&self, schedulables: &[Schedulable]) -> u32 {
        self.blocks(schedulables).map(|(_, b)| b.minutes).sum()
    }

    /// Materializes every created block once, in creation order.
    ///
    /// Stops at the first failure; blocks materialized before it keep their
    /// references.
    pub fn materialize<B: Backend + ?Sized>(
        &self,
        schedulables: &mut [Schedulable],
        backend: &mut B,
    ) -> Result<usize, Error> {
        for handle in &self.created {
            let owner = schedulables
                .get_mut(handle.schedulable)
                .ok_or_else(|| Error::UnknownBlock {
                    owner: format!("schedulable #{}", handle.schedulable),
                    index: handle.block,
                })?;
            owner.materialize_block(handle.block, backend)?;
        }
        Ok(self.created.len())
    }
}

/// Backlog entry; the position breaks full key ties by discovery order.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct BacklogEntry {
    key: PriorityKey,
    position: usize,
}

/// Min-first queue of schedulables still needing time.
struct Backlog {
    heap: BinaryHeap<Reverse<BacklogEntry>>,
    formula: PctScheduledFormula,
}

impl Backlog {
    fn new(schedulables: &[Schedulable], formula: PctScheduledFormula) -> Self {
        let mut backlog = Self {
            heap: BinaryHeap::with_capacity(schedulables.len()),
            formula,
        };
        for (position, schedulable) in schedulables.iter().enumerate() {
            backlog.push(position, schedulable);
        }
        backlog
    }

    /// Queues the schedulable under a freshly computed key, if it has one.
    fn push(&mut self, position: usize, schedulable: &Schedulable) -> bool {
        match priority(schedulable, self.formula) {
            Some(key) => {
                self.heap.push(Reverse(BacklogEntry { key, position }));
                true
            }
            None => false,
        }
    }

    fn pop(&mut self) -> Option<usize> {
        self.heap.pop().map(|Reverse(entry)| entry.position)
    }

    fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

/// Allocates `session` across `schedulables`.
///
/// New blocks are appended to their owners; the returned handles point at
/// them. Nothing is persisted here.
pub fn allocate(
    session: WorkSession,
    schedulables: &mut [Schedulable],
    config: &AllocationConfig,
) -> Allocation {
    let mut created = Vec::new();
    let total = session.total_minutes;
    let work_period = config.work_period_minutes;

    if work_period == 0 {
        tracing::warn!("work period is zero minutes, nothing can be allocated");
        return Allocation { session, created };
    }

    let mut backlog = Backlog::new(schedulables, config.pct_scheduled);
    let mut session_elapsed: u32 = 0;

    while session_elapsed < total && !backlog.is_empty() {
        tracing::debug!(session_elapsed, "starting work period");
        let mut period_elapsed: u32 = 0;

        while session_elapsed < total && period_elapsed < work_period {
            let Some(position) = backlog.pop() else {
                break;
            };
            let schedulable = &mut schedulables[position];
            let start = session.offset(session_elapsed);
            let max_minutes = (work_period - period_elapsed).min(total - session_elapsed);

            let Some(block) = schedulable.create_block(start, max_minutes) else {
                tracing::debug!(
                    schedulable = %schedulable.id,
                    "no remaining need, dropping from backlog"
                );
                continue;
            };
            let minutes = schedulable.blocks[block].minutes;
            tracing::debug!(
                schedulable = %schedulable.id,
                %start,
                minutes,
                "created block"
            );

            period_elapsed += minutes;
            session_elapsed += minutes;
            created.push(BlockHandle {
                schedulable: position,
                block,
            });

            if !backlog.push(position, schedulable) {
                tracing::debug!(schedulable = %schedulable.id, "fully scheduled");
            }
        }

        session_elapsed = session_elapsed.saturating_add(config.break_period_minutes);
    }

    tracing::info!(
        session = %session.id,
        blocks = created.len(),
        "allocated work session"
    );
    Allocation { session, created }
}
