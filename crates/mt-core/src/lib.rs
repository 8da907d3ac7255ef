//! Core domain logic for the mindtime scheduler.
//!
//! This crate contains the fundamental types and logic for:
//! - Entities: work sessions, schedulables and their task-work blocks
//! - Priority: which schedulable gets time next
//! - Allocation: slicing a work session into work periods and breaks
//! - The persistence boundary a scheduling run is driven through

mod allocation;
pub mod backend;
mod error;
pub mod marker;
mod priority;
mod schedulable;
pub mod scheduler;
mod session;
pub mod types;

pub use allocation::{Allocation, AllocationConfig, BlockHandle, allocate};
pub use backend::Backend;
pub use error::{Error, StorageError};
pub use priority::{PriorityKey, priority};
pub use schedulable::{BlockIndex, Schedulable, TaskWorkBlock};
pub use scheduler::{ScheduleOptions, ScheduleRun, schedule};
pub use session::WorkSession;
pub use types::{ExternalRef, ItemId, PctScheduledFormula, ProjectId, ValidationError};
