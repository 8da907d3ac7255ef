//! The persistence boundary the scheduler runs against.

use crate::error::Error;
use crate::schedulable::{Schedulable, TaskWorkBlock};
use crate::session::WorkSession;
use crate::types::ExternalRef;

/// A task-tracking store holding work sessions, schedulables and blocks.
///
/// A scheduling run owns its backend exclusively. Materializations are
/// buffered until [`Backend::commit`], which flushes them as one batch.
pub trait Backend {
    /// Returns the work sessions in the namespace called `namespace`.
    ///
    /// Fails with [`Error::AmbiguousNamespace`] when several namespaces carry
    /// the name and [`Error::NotFound`] when none does.
    fn fetch_work_sessions(&mut self, namespace: &str) -> Result<Vec<WorkSession>, Error>;

    /// Returns every schedulable, each carrying all of its existing blocks.
    fn fetch_schedulables_with_history(&mut self) -> Result<Vec<Schedulable>, Error>;

    /// Queues `block` as a new item owned by `owner` and returns its reference.
    ///
    /// Callers go through [`Schedulable::materialize_block`], which refuses
    /// blocks that already carry a reference.
    fn materialize(
        &mut self,
        owner: &Schedulable,
        block: &TaskWorkBlock,
    ) -> Result<ExternalRef, Error>;

    /// Writes all queued items and returns how many were written.
    fn commit(&mut self) -> Result<usize, Error>;
}
