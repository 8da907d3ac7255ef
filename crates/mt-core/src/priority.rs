//! Ordering key deciding which schedulable gets time next.

use std::cmp::Ordering;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::schedulable::Schedulable;
use crate::types::PctScheduledFormula;

/// `(pct_scheduled, pct_complete, due_at)`, compared lexicographically.
///
/// Smaller keys are more urgent: the least scheduled task first, then the
/// least complete, then the earliest due.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PriorityKey {
    pub pct_scheduled: f64,
    pub pct_complete: f64,
    pub due_at: NaiveDateTime,
}

impl PartialEq for PriorityKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PriorityKey {}

impl PartialOrd for PriorityKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PriorityKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.pct_scheduled
            .total_cmp(&other.pct_scheduled)
            .then_with(|| self.pct_complete.total_cmp(&other.pct_complete))
            .then_with(|| self.due_at.cmp(&other.due_at))
    }
}

/// Computes the priority key of `schedulable` from its current blocks.
///
/// `None` once the schedulable is fully scheduled, or when it requires no
/// time at all.
pub fn priority(schedulable: &Schedulable, formula: PctScheduledFormula) -> Option<PriorityKey> {
    let pct_scheduled = schedulable.pct_scheduled(formula)?;
    if pct_scheduled >= 1.0 {
        return None;
    }
    Some(PriorityKey {
        pct_scheduled,
        pct_complete: schedulable.pct_complete()?,
        due_at: schedulable.due_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedulable::tests::{schedulable, ts, with_block};

    const H: PctScheduledFormula = PctScheduledFormula::Historical;

    #[test]
    fn fresh_schedulable_has_zero_key() {
        let key = priority(&schedulable("a", 60, "2025-01-16"), H).unwrap();
        assert!(key.pct_scheduled.abs() < f64::EPSILON);
        assert!(key.pct_complete.abs() < f64::EPSILON);
        assert_eq!(key.due_at, ts("2025-01-16"));
    }

    #[test]
    fn fully_planned_has_no_key() {
        let s = with_block(schedulable("a", 60, "2025-01-16"), 60, false);
        assert!(priority(&s, H).is_none());
    }

    #[test]
    fn zero_required_has_no_key() {
        assert!(priority(&schedulable("a", 0, "2025-01-16"), H).is_none());
    }

    #[test]
    fn any_checked_minute_saturates_historical_key() {
        let s = with_block(schedulable("a", 600, "2025-01-16"), 1, true);
        assert!(priority(&s, H).is_none());
        assert!(priority(&s, PctScheduledFormula::Proportional).is_some());
    }

    #[test]
    fn less_scheduled_sorts_first() {
        let little = with_block(schedulable("a", 100, "2025-01-20"), 10, false);
        let lots = with_block(schedulable("b", 100, "2025-01-16"), 50, false);
        assert!(priority(&little, H).unwrap() < priority(&lots, H).unwrap());
    }

    #[test]
    fn completion_breaks_scheduled_ties() {
        let p = PctScheduledFormula::Proportional;
        let done = with_block(schedulable("a", 100, "2025-01-16"), 20, true);
        let planned = with_block(schedulable("b", 100, "2025-01-20"), 20, false);
        assert!(priority(&planned, p).unwrap() < priority(&done, p).unwrap());
    }

    #[test]
    fn due_date_breaks_remaining_ties() {
        let early = schedulable("a", 30, "2025-01-15");
        let late = schedulable("b", 200, "2025-01-16");
        assert!(priority(&early, H).unwrap() < priority(&late, H).unwrap());
    }

    #[test]
    fn equal_keys_compare_equal() {
        let a = priority(&schedulable("a", 30, "2025-01-15"), H).unwrap();
        let b = priority(&schedulable("b", 90, "2025-01-15"), H).unwrap();
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }
}
