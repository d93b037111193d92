use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::collections::BTreeMap;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Canonical 1-based month index for a month name. Accepts full names and
/// three-letter abbreviations, case-insensitively.
pub fn month_index(name: &str) -> Option<u32> {
    let t = name.trim();
    if t.len() < 3 {
        return None;
    }
    MONTH_NAMES
        .iter()
        .position(|m| m.eq_ignore_ascii_case(t) || (t.len() == 3 && m[..3].eq_ignore_ascii_case(t)))
        .map(|i| i as u32 + 1)
}

pub fn month_name(index: u32) -> Option<&'static str> {
    if (1..=12).contains(&index) {
        Some(MONTH_NAMES[index as usize - 1])
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum DayStatus {
    Present,
    Absent,
    Leave,
}

/// One entry of `days`; only the status takes part in aggregation, the
/// `date` is left in the stored document.
#[derive(Debug, Clone, Deserialize)]
pub struct DayEntry {
    pub status: DayStatus,
}

/// A `subjectWiseAttendance` value. Older documents store a bare percentage,
/// newer ones a per-subject record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SubjectAttendance {
    Percentage(f64),
    Record {
        #[serde(default)]
        present: i64,
        #[serde(default)]
        absent: i64,
        #[serde(default, rename = "attendancePercentage")]
        attendance_percentage: Option<f64>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub student_id: String,
    pub year: i32,
    pub month: String,
    #[serde(default)]
    pub month_index: Option<i64>,
    #[serde(default)]
    pub attendance_percentage: Option<f64>,
    #[serde(default)]
    pub present_count: Option<i64>,
    #[serde(default)]
    pub absent_count: Option<i64>,
    #[serde(default)]
    pub leave_count: Option<i64>,
    #[serde(default)]
    pub days: Option<Vec<DayEntry>>,
    #[serde(default)]
    pub subject_wise_attendance: Option<BTreeMap<String, SubjectAttendance>>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Snapshot {
    pub fn parse(doc: &serde_json::Value) -> anyhow::Result<Self> {
        let snapshot: Snapshot =
            serde_json::from_value(doc.clone()).context("malformed attendance snapshot")?;
        if snapshot.student_id.trim().is_empty() {
            return Err(anyhow!("snapshot studentId is empty"));
        }
        if snapshot.month.trim().is_empty() {
            return Err(anyhow!("snapshot month is empty"));
        }
        let counts = [
            ("presentCount", snapshot.present_count),
            ("absentCount", snapshot.absent_count),
            ("leaveCount", snapshot.leave_count),
        ];
        if let Some((field, _)) = counts.iter().find(|(_, v)| v.is_some_and(|n| n < 0)) {
            return Err(anyhow!("snapshot {} is negative", field));
        }
        let negative_subject = snapshot
            .subject_wise_attendance
            .iter()
            .flatten()
            .find(|(_, v)| {
                matches!(v, SubjectAttendance::Record { present, absent, .. } if *present < 0 || *absent < 0)
            });
        if let Some((subject, _)) = negative_subject {
            return Err(anyhow!("subject {} has a negative count", subject));
        }
        Ok(snapshot)
    }

    /// Canonical month name when the stored one is recognised.
    pub fn canonical_month(&self) -> Option<&'static str> {
        month_index(&self.month).and_then(month_name)
    }

    /// Ordering key for the month: stored `monthIndex` when valid, then the
    /// name lookup, else 0.
    pub fn effective_month_index(&self) -> u32 {
        if let Some(idx) = self.month_index {
            if (1..=12).contains(&idx) {
                return idx as u32;
            }
        }
        month_index(&self.month).unwrap_or(0)
    }

    pub fn percentage(&self) -> f64 {
        self.attendance_percentage.unwrap_or(0.0)
    }

    fn count_days(&self, status: DayStatus) -> i64 {
        self.days
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|d| d.status == status)
            .count() as i64
    }

    pub fn present(&self) -> i64 {
        self.present_count
            .unwrap_or_else(|| self.count_days(DayStatus::Present))
    }

    pub fn absent(&self) -> i64 {
        self.absent_count
            .unwrap_or_else(|| self.count_days(DayStatus::Absent))
    }

    pub fn leaves(&self) -> i64 {
        self.leave_count
            .unwrap_or_else(|| self.count_days(DayStatus::Leave))
    }
}
