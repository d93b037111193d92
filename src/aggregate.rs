use serde::Serialize;

use crate::snapshot::{Snapshot, SubjectAttendance};

pub const GOOD_THRESHOLD: f64 = 85.0;
pub const AVERAGE_THRESHOLD: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttendanceStatus {
    Good,
    Average,
    Poor,
}

pub fn classify(percentage: f64) -> AttendanceStatus {
    if percentage >= GOOD_THRESHOLD {
        AttendanceStatus::Good
    } else if percentage >= AVERAGE_THRESHOLD {
        AttendanceStatus::Average
    } else {
        AttendanceStatus::Poor
    }
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderTotals {
    pub total_classes: i64,
    pub attended: i64,
    pub absent: i64,
    pub leaves: i64,
    pub attendance_percentage: f64,
}

pub fn header_totals(snapshot: Option<&Snapshot>) -> HeaderTotals {
    let Some(s) = snapshot else {
        return HeaderTotals::default();
    };
    let attended = s.present();
    let absent = s.absent();
    let leaves = s.leaves();
    HeaderTotals {
        total_classes: attended.saturating_add(absent).saturating_add(leaves),
        attended,
        absent,
        leaves,
        attendance_percentage: s.percentage(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRate {
    pub month: String,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateSeries {
    pub year: i32,
    pub attendance_rate: f64,
    pub monthly_rates: Vec<MonthlyRate>,
}

impl RateSeries {
    pub fn empty(year: i32) -> Self {
        Self {
            year,
            attendance_rate: 0.0,
            monthly_rates: Vec::new(),
        }
    }
}

/// Groups snapshots by calendar month; unrecognised month names group by name.
fn month_key(s: &Snapshot) -> (u32, String) {
    match s.effective_month_index() {
        0 => (0, s.month.trim().to_ascii_lowercase()),
        idx => (idx, String::new()),
    }
}

/// Month-ordered series for one year, one entry per month. Duplicates keep
/// the most recently created snapshot; on equal `createdAt` the later one in
/// `snapshots` wins. The yearly rate is the plain mean of the kept monthly
/// percentages, not weighted by class counts.
pub fn rate_series(year: i32, mut snapshots: Vec<Snapshot>) -> RateSeries {
    if snapshots.is_empty() {
        return RateSeries::empty(year);
    }
    snapshots.sort_by(|a, b| {
        month_key(a)
            .cmp(&month_key(b))
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
    let mut kept: Vec<Snapshot> = Vec::with_capacity(snapshots.len());
    for s in snapshots {
        match kept.last_mut() {
            Some(last) if month_key(last) == month_key(&s) => *last = s,
            _ => kept.push(s),
        }
    }
    let snapshots = kept;
    let total: f64 = snapshots.iter().map(Snapshot::percentage).sum();
    let attendance_rate = round2(total / snapshots.len() as f64);
    RateSeries {
        year,
        attendance_rate,
        monthly_rates: snapshots
            .into_iter()
            .map(|s| MonthlyRate {
                percentage: s.percentage(),
                month: s.month,
            })
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRow {
    pub subject: String,
    pub total_classes: i64,
    pub present: i64,
    pub absent: i64,
    pub attendance_percentage: f64,
    pub status: AttendanceStatus,
}

fn subject_row(subject: &str, value: &SubjectAttendance) -> SubjectRow {
    let (present, absent, percentage) = match *value {
        SubjectAttendance::Percentage(p) => (0, 0, p),
        SubjectAttendance::Record {
            present,
            absent,
            attendance_percentage,
        } => {
            let total = present.saturating_add(absent);
            let derived = if total > 0 {
                round2(present as f64 * 100.0 / total as f64)
            } else {
                0.0
            };
            (present, absent, attendance_percentage.unwrap_or(derived))
        }
    };
    SubjectRow {
        subject: subject.to_string(),
        total_classes: present.saturating_add(absent),
        present,
        absent,
        attendance_percentage: percentage,
        status: classify(percentage),
    }
}

/// Normalised rows from `subjectWiseAttendance`, ordered by subject name.
/// Empty when the snapshot has no subject map.
pub fn subject_rows(snapshot: &Snapshot) -> Vec<SubjectRow> {
    snapshot
        .subject_wise_attendance
        .as_ref()
        .map(|map| map.iter().map(|(k, v)| subject_row(k, v)).collect())
        .unwrap_or_default()
}

/// Last-resort rows: every course stamped with the snapshot's overall figures.
pub fn course_rows(snapshot: Option<&Snapshot>, courses: &[String]) -> Vec<SubjectRow> {
    let totals = header_totals(snapshot);
    courses
        .iter()
        .map(|course| SubjectRow {
            subject: course.clone(),
            total_classes: totals.total_classes,
            present: totals.attended,
            absent: totals.absent,
            attendance_percentage: totals.attendance_percentage,
            status: classify(totals.attendance_percentage),
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParentSummary {
    pub present: i64,
    pub absent: i64,
    pub leaves: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub month: String,
    pub year: i32,
    pub total_present: i64,
    pub total_absent: i64,
    pub total_leaves: i64,
}

pub fn parent_summary(snapshot: Option<&Snapshot>) -> ParentSummary {
    let totals = header_totals(snapshot);
    ParentSummary {
        present: totals.attended,
        absent: totals.absent,
        leaves: totals.leaves,
    }
}

/// `month`/`year` echo the snapshot actually used, or the requested period
/// when there is none.
pub fn student_summary(snapshot: Option<&Snapshot>, month: &str, year: i32) -> StudentSummary {
    let totals = header_totals(snapshot);
    StudentSummary {
        month: snapshot.map(|s| s.month.clone()).unwrap_or_else(|| month.to_string()),
        year: snapshot.map(|s| s.year).unwrap_or(year),
        total_present: totals.attended,
        total_absent: totals.absent,
        total_leaves: totals.leaves,
    }
}
