//! One scheduling run: load, allocate, materialize, commit.

use crate::allocation::{Allocation, AllocationConfig, allocate};
use crate::backend::Backend;
use crate::error::Error;
use crate::schedulable::{Schedulable, TaskWorkBlock};
use crate::types::ItemId;

/// Knobs for a single run.
#[derive(Debug, Clone, Default)]
pub struct ScheduleOptions {
    /// Allocate this session instead of the first one found.
    pub session_id: Option<ItemId>,

    /// Allocate without materializing or committing anything.
    pub dry_run: bool,
}

/// Outcome of a run.
#[derive(Debug)]
pub struct ScheduleRun {
    /// Every schedulable as it stands after allocation.
    pub schedulables: Vec<Schedulable>,

    /// The allocation pass.
    pub allocation: Allocation,

    /// Items written by the commit; `None` on a dry run.
    pub committed: Option<usize>,
}

impl ScheduleRun {
    /// Blocks created by this run, in creation order.
    pub fn blocks(&self) -> impl Iterator<Item = &TaskWorkBlock> {
        self.allocation
            .blocks(&self.schedulables)
            .map(|(_, block)| block)
    }
}

/// Allocates one work session from `namespace` and persists the new blocks.
///
/// Takes the first session the backend returns unless
/// [`ScheduleOptions::session_id`] names another. A failed commit is
/// returned as is; nothing is retried.
pub fn schedule<B: Backend + ?Sized>(
    backend: &mut B,
    namespace: &str,
    config: &AllocationConfig,
    options: &ScheduleOptions,
) -> Result<ScheduleRun, Error> {
    let sessions = backend.fetch_work_sessions(namespace)?;
    tracing::debug!(namespace, count = sessions.len(), "fetched work sessions");

    let session = match &options.session_id {
        Some(id) => sessions
            .into_iter()
            .find(|s| &s.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?,
        None => sessions
            .into_iter()
            .next()
            .ok_or_else(|| Error::NoWorkSession(namespace.to_string()))?,
    };
    tracing::info!(%session, start = %session.start, "scheduling work session");

    let mut schedulables = backend.fetch_schedulables_with_history()?;
    tracing::debug!(count = schedulables.len(), "fetched schedulables");

    let allocation = allocate(session, &mut schedulables, config);

    let committed = if options.dry_run {
        None
    } else {
        allocation.materialize(&mut schedulables, backend)?;
        let written = backend.commit()?;
        tracing::info!(written, "committed new blocks");
        Some(written)
    };

    Ok(ScheduleRun {
        schedulables,
        allocation,
        committed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedulable::tests::{schedulable, ts};
    use crate::session::WorkSession;
    use crate::types::ExternalRef;

    /// In-memory backend over fixed sessions and schedulables.
    struct FixtureBackend {
        sessions: Vec<WorkSession>,
        schedulables: Vec<Schedulable>,
        queued: Vec<String>,
        written: Vec<String>,
        fail_commit: bool,
    }

    impl FixtureBackend {
        fn new(sessions: Vec<WorkSession>, schedulables: Vec<Schedulable>) -> Self {
            Self {
                sessions,
                schedulables,
                queued: Vec::new(),
                written: Vec::new(),
                fail_commit: false,
            }
        }
    }

    impl Backend for FixtureBackend {
        fn fetch_work_sessions(&mut self, namespace: &str) -> Result<Vec<WorkSession>, Error> {
            if namespace == "Life" {
                Ok(self.sessions.clone())
            } else {
                Err(Error::NotFound(namespace.to_string()))
            }
        }

        fn fetch_schedulables_with_history(&mut self) -> Result<Vec<Schedulable>, Error> {
            Ok(self.schedulables.clone())
        }

        fn materialize(
            &mut self,
            _owner: &Schedulable,
            block: &TaskWorkBlock,
        ) -> Result<ExternalRef, Error> {
            self.queued.push(block.to_string());
            Ok(ItemId::new(format!("q{}", self.queued.len())).unwrap())
        }

        fn commit(&mut self) -> Result<usize, Error> {
            if self.fail_commit {
                return Err(Error::storage(std::io::Error::other("backend offline")));
            }
            let count = self.queued.len();
            self.written.append(&mut self.queued);
            Ok(count)
        }
    }

    fn work_session(id: &str, start: &str, minutes: u32) -> WorkSession {
        WorkSession {
            id: ItemId::new(id).unwrap(),
            content: format!("Work Time {{{minutes}m}}"),
            start: ts(start),
            total_minutes: minutes,
        }
    }

    #[test]
    fn schedules_first_session_and_commits() {
        let mut backend = FixtureBackend::new(
            vec![
                work_session("ws-1", "2025-01-15T09:00:00", 130),
                work_session("ws-2", "2025-01-16T09:00:00", 60),
            ],
            vec![schedulable("report", 120, "2025-01-16")],
        );

        let run = schedule(
            &mut backend,
            "Life",
            &AllocationConfig::default(),
            &ScheduleOptions::default(),
        )
        .unwrap();

        assert_eq!(run.allocation.session.id.as_str(), "ws-1");
        assert_eq!(run.committed, Some(2));
        assert_eq!(
            backend.written,
            vec![
                "[ST]report{55m} [55m] @ 2025-01-15 09:00:00",
                "[ST]report{55m} [55m] @ 2025-01-15 10:10:00",
            ]
        );
        assert!(run.blocks().all(TaskWorkBlock::is_materialized));
    }

    #[test]
    fn picks_requested_session() {
        let mut backend = FixtureBackend::new(
            vec![
                work_session("ws-1", "2025-01-15T09:00:00", 130),
                work_session("ws-2", "2025-01-16T14:00:00", 30),
            ],
            vec![schedulable("report", 120, "2025-01-16")],
        );
        let options = ScheduleOptions {
            session_id: Some(ItemId::new("ws-2").unwrap()),
            dry_run: false,
        };

        let run = schedule(&mut backend, "Life", &AllocationConfig::default(), &options).unwrap();
        assert_eq!(
            backend.written,
            vec!["[ST]report{30m} [30m] @ 2025-01-16 14:00:00"]
        );
        assert_eq!(run.allocation.session.id.as_str(), "ws-2");
    }

    #[test]
    fn unknown_session_id_is_not_found() {
        let mut backend = FixtureBackend::new(
            vec![work_session("ws-1", "2025-01-15T09:00:00", 130)],
            Vec::new(),
        );
        let options = ScheduleOptions {
            session_id: Some(ItemId::new("nope").unwrap()),
            dry_run: false,
        };
        let err = schedule(&mut backend, "Life", &AllocationConfig::default(), &options)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(ref id) if id == "nope"));
    }

    #[test]
    fn empty_namespace_has_no_session() {
        let mut backend = FixtureBackend::new(Vec::new(), Vec::new());
        let err = schedule(
            &mut backend,
            "Life",
            &AllocationConfig::default(),
            &ScheduleOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::NoWorkSession(_)));
    }

    #[test]
    fn lookup_failure_aborts_run() {
        let mut backend = FixtureBackend::new(Vec::new(), Vec::new());
        let err = schedule(
            &mut backend,
            "Work",
            &AllocationConfig::default(),
            &ScheduleOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn dry_run_touches_nothing() {
        let mut backend = FixtureBackend::new(
            vec![work_session("ws-1", "2025-01-15T09:00:00", 60)],
            vec![schedulable("report", 120, "2025-01-16")],
        );
        let options = ScheduleOptions {
            session_id: None,
            dry_run: true,
        };

        let run = schedule(&mut backend, "Life", &AllocationConfig::default(), &options).unwrap();
        assert_eq!(run.committed, None);
        assert_eq!(run.blocks().count(), 1);
        assert!(run.blocks().all(|b| !b.is_materialized()));
        assert!(backend.queued.is_empty());
        assert!(backend.written.is_empty());
    }

    #[test]
    fn commit_failure_surfaces() {
        let mut backend = FixtureBackend::new(
            vec![work_session("ws-1", "2025-01-15T09:00:00", 60)],
            vec![schedulable("report", 120, "2025-01-16")],
        );
        backend.fail_commit = true;

        let err = schedule(
            &mut backend,
            "Life",
            &AllocationConfig::default(),
            &ScheduleOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert!(backend.written.is_empty());
        assert_eq!(backend.queued.len(), 1);
    }
}
