//! Attendance queries shared by the parent and student portals.
//!
//! Every function resolves through the store and shapes the result; `Ok`
//! always carries a complete payload, with "no data" expressed as zeros.

use crate::aggregate::{
    self, HeaderTotals, ParentSummary, RateSeries, StudentSummary, SubjectRow,
};
use crate::clock::Clock;
use crate::resolver::{self, Period};
use crate::store::SnapshotStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Portal {
    Parent,
    Student,
}

impl Portal {
    pub fn name(self) -> &'static str {
        match self {
            Portal::Parent => "parent",
            Portal::Student => "student",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AttendanceQuery<'a> {
    pub student_id: &'a str,
    pub year: Option<i32>,
    pub month: Option<&'a str>,
}

impl<'a> AttendanceQuery<'a> {
    pub fn period(&self, clock: &dyn Clock) -> Period {
        Period::target(clock, self.year, self.month)
    }
}

pub fn header<S: SnapshotStore + ?Sized>(
    store: &S,
    clock: &dyn Clock,
    query: &AttendanceQuery<'_>,
) -> anyhow::Result<HeaderTotals> {
    let snapshot = resolver::resolve(store, query.student_id, &query.period(clock))?;
    Ok(aggregate::header_totals(snapshot.as_ref()))
}

/// Series for the year of the resolved snapshot (current period, falling
/// back to the latest one).
pub fn rate_series<S: SnapshotStore + ?Sized>(
    store: &S,
    clock: &dyn Clock,
    student_id: &str,
) -> anyhow::Result<RateSeries> {
    let target = Period::target(clock, None, None);
    let Some(resolved) = resolver::resolve(store, student_id, &target)? else {
        return Ok(RateSeries::empty(target.year));
    };
    let snapshots = store.list_for_year(student_id, resolved.year)?;
    Ok(aggregate::rate_series(resolved.year, snapshots))
}

pub fn parent_summary<S: SnapshotStore + ?Sized>(
    store: &S,
    clock: &dyn Clock,
    query: &AttendanceQuery<'_>,
) -> anyhow::Result<ParentSummary> {
    let snapshot = resolver::resolve(store, query.student_id, &query.period(clock))?;
    Ok(aggregate::parent_summary(snapshot.as_ref()))
}

pub fn student_summary<S: SnapshotStore + ?Sized>(
    store: &S,
    clock: &dyn Clock,
    query: &AttendanceQuery<'_>,
) -> anyhow::Result<StudentSummary> {
    let target = query.period(clock);
    let snapshot = resolver::resolve(store, query.student_id, &target)?;
    Ok(aggregate::student_summary(
        snapshot.as_ref(),
        &target.month,
        target.year,
    ))
}

/// Subject breakdown. When the resolved snapshot has no subject map the
/// student portal approximates from the course catalogue; the parent portal
/// returns nothing.
pub fn subjects<S: SnapshotStore + ?Sized>(
    store: &S,
    clock: &dyn Clock,
    query: &AttendanceQuery<'_>,
    portal: Portal,
) -> anyhow::Result<Vec<SubjectRow>> {
    let snapshot = resolver::resolve(store, query.student_id, &query.period(clock))?;
    let rows = snapshot
        .as_ref()
        .map(aggregate::subject_rows)
        .unwrap_or_default();
    if !rows.is_empty() {
        return Ok(rows);
    }
    match portal {
        Portal::Parent => Ok(rows),
        Portal::Student => {
            let courses = store.courses_for_student(query.student_id)?;
            log::debug!(
                "no subject map for {}, stamping {} courses",
                query.student_id,
                courses.len()
            );
            Ok(aggregate::course_rows(snapshot.as_ref(), &courses))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::AttendanceStatus;
    use crate::clock::FixedClock;
    use crate::resolver::tests::MemoryStore;
    use chrono::NaiveDate;
    use serde_json::json;

    fn march_2026() -> FixedClock {
        FixedClock::new(NaiveDate::from_ymd_opt(2026, 3, 10).expect("date"))
    }

    fn query(student_id: &str) -> AttendanceQuery<'_> {
        AttendanceQuery {
            student_id,
            year: None,
            month: None,
        }
    }

    #[test]
    fn yearly_rate_scenario_for_latest_year() {
        let store = MemoryStore::with(vec![
            json!({ "studentId": "STU001", "year": 2025, "month": "December", "attendancePercentage": 80 }),
            json!({ "studentId": "STU001", "year": 2025, "month": "November", "attendancePercentage": 90 }),
            json!({ "studentId": "STU001", "year": 2024, "month": "May", "attendancePercentage": 10 }),
        ]);
        let series = rate_series(&store, &march_2026(), "STU001").expect("series");
        assert_eq!(series.year, 2025);
        assert_eq!(series.attendance_rate, 85.0);
        assert_eq!(
            serde_json::to_value(&series.monthly_rates).expect("json"),
            json!([
                { "month": "November", "percentage": 90.0 },
                { "month": "December", "percentage": 80.0 }
            ])
        );
    }

    #[test]
    fn empty_student_gets_zeroed_shapes() {
        let store = MemoryStore::default();
        let clock = march_2026();
        assert_eq!(header(&store, &clock, &query("STU404")).expect("header"), HeaderTotals::default());
        assert_eq!(rate_series(&store, &clock, "STU404").expect("series"), RateSeries::empty(2026));
        assert_eq!(parent_summary(&store, &clock, &query("STU404")).expect("summary"), ParentSummary::default());
        let summary = student_summary(&store, &clock, &query("STU404")).expect("summary");
        assert_eq!((summary.month.as_str(), summary.year), ("March", 2026));
        assert!(subjects(&store, &clock, &query("STU404"), Portal::Parent).expect("subjects").is_empty());
    }

    #[test]
    fn subject_fallback_differs_per_portal() {
        let mut store = MemoryStore::with(vec![json!({
            "studentId": "STU001", "year": 2026, "month": "March",
            "presentCount": 14, "absentCount": 4, "leaveCount": 2, "attendancePercentage": 72.5,
            "subjectWiseAttendance": {}
        })]);
        store.courses = vec!["English".to_string(), "Mathematics".to_string()];
        let clock = march_2026();

        assert!(subjects(&store, &clock, &query("STU001"), Portal::Parent)
            .expect("parent")
            .is_empty());

        let rows = subjects(&store, &clock, &query("STU001"), Portal::Student).expect("student");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].subject, "Mathematics");
        assert_eq!(rows[1].attendance_percentage, 72.5);
        assert_eq!(rows[1].status, AttendanceStatus::Average);
        assert_eq!(rows[1].total_classes, 20);
    }

    #[test]
    fn store_failure_is_reported_to_caller() {
        let store = MemoryStore {
            fail: true,
            ..Default::default()
        };
        assert!(header(&store, &march_2026(), &query("STU001")).is_err());
    }
}
