use std::cmp::Ordering;

use crate::clock::Clock;
use crate::snapshot::Snapshot;
use crate::store::SnapshotStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period {
    pub year: i32,
    pub month: String,
    /// The caller named the year; fallback looks inside it first.
    pub year_requested: bool,
}

impl Period {
    /// Fills whichever of year/month the caller left out from the clock.
    pub fn target(clock: &dyn Clock, year: Option<i32>, month: Option<&str>) -> Self {
        Self {
            year: year.unwrap_or_else(|| clock.current_year()),
            month: month
                .map(|m| m.trim().to_string())
                .unwrap_or_else(|| clock.current_month_name().to_string()),
            year_requested: year.is_some(),
        }
    }
}

/// Recency order used by the fallback: year, then month, then insertion time.
pub fn cmp_recency(a: &Snapshot, b: &Snapshot) -> Ordering {
    a.year
        .cmp(&b.year)
        .then_with(|| a.effective_month_index().cmp(&b.effective_month_index()))
        .then_with(|| a.created_at.cmp(&b.created_at))
}

/// Most recent snapshot by `cmp_recency`. On a full tie the earliest element
/// wins, so callers should pass snapshots newest-inserted first.
pub fn latest(snapshots: Vec<Snapshot>) -> Option<Snapshot> {
    snapshots.into_iter().reduce(|best, candidate| {
        if cmp_recency(&candidate, &best) == Ordering::Greater {
            candidate
        } else {
            best
        }
    })
}

/// Exact period first, then the latest snapshot of a requested year, else the
/// student's most recent snapshot. `None` only when the student has no
/// snapshots at all.
pub fn resolve<S: SnapshotStore + ?Sized>(
    store: &S,
    student_id: &str,
    target: &Period,
) -> anyhow::Result<Option<Snapshot>> {
    if let Some(found) = store.find_exact(student_id, target.year, &target.month)? {
        return Ok(Some(found));
    }
    let mut fallback = None;
    if target.year_requested {
        // Oldest first from the store; reversed so later insertions win ties.
        let mut in_year = store.list_for_year(student_id, target.year)?;
        in_year.reverse();
        fallback = latest(in_year);
    }
    if fallback.is_none() {
        fallback = latest(store.list_for_student(student_id)?);
    }
    if let Some(s) = fallback.as_ref() {
        log::debug!(
            "no snapshot for {} {} {}, falling back to {} {}",
            student_id,
            target.month,
            target.year,
            s.month,
            s.year
        );
    }
    Ok(fallback)
}
