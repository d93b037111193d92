use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::snapshot::Snapshot;

/// Read access to attendance snapshots and the course catalogue.
pub trait SnapshotStore {
    /// Newest snapshot for exactly this period, if any.
    fn find_exact(&self, student_id: &str, year: i32, month: &str)
        -> anyhow::Result<Option<Snapshot>>;
    fn list_for_student(&self, student_id: &str) -> anyhow::Result<Vec<Snapshot>>;
    fn list_for_year(&self, student_id: &str, year: i32) -> anyhow::Result<Vec<Snapshot>>;
    /// Course names for the student's education level, sorted by name.
    fn courses_for_student(&self, student_id: &str) -> anyhow::Result<Vec<String>>;
}

pub struct SqliteSnapshotStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteSnapshotStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn query_snapshots(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> anyhow::Result<Vec<Snapshot>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(doc, created_at)| decode_row(&doc, created_at))
            .collect()
    }
}

fn decode_row(doc: &str, created_at: String) -> anyhow::Result<Snapshot> {
    let value: serde_json::Value =
        serde_json::from_str(doc).context("stored snapshot is not valid json")?;
    let mut snapshot = Snapshot::parse(&value)?;
    snapshot.created_at = Some(created_at);
    Ok(snapshot)
}

impl SnapshotStore for SqliteSnapshotStore<'_> {
    fn find_exact(
        &self,
        student_id: &str,
        year: i32,
        month: &str,
    ) -> anyhow::Result<Option<Snapshot>> {
        // Rows written outside snapshots.import may still carry "Mar".
        let month = month.trim();
        let abbrev = month.get(..3).unwrap_or(month);
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT doc, created_at
                 FROM attendance_snapshots
                 WHERE student_id = ?1 AND year = ?2
                   AND (month = ?3 COLLATE NOCASE OR month = ?4 COLLATE NOCASE)
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT 1",
                (student_id, year, month, abbrev),
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;
        row.map(|(doc, created_at)| decode_row(&doc, created_at))
            .transpose()
    }

    fn list_for_student(&self, student_id: &str) -> anyhow::Result<Vec<Snapshot>> {
        self.query_snapshots(
            "SELECT doc, created_at
             FROM attendance_snapshots
             WHERE student_id = ?
             ORDER BY created_at DESC, rowid DESC",
            [student_id],
        )
    }

    fn list_for_year(&self, student_id: &str, year: i32) -> anyhow::Result<Vec<Snapshot>> {
        self.query_snapshots(
            "SELECT doc, created_at
             FROM attendance_snapshots
             WHERE student_id = ? AND year = ?
             ORDER BY created_at, rowid",
            (student_id, year),
        )
    }

    fn courses_for_student(&self, student_id: &str) -> anyhow::Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.name
             FROM courses c
             JOIN students s ON s.education_level = c.education_level COLLATE NOCASE
             WHERE s.id = ?
             ORDER BY c.name",
        )?;
        let names = stmt
            .query_map([student_id], |r| r.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

pub fn stamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// A validated document ready for insertion. Recognised month names are
/// stored in canonical form, and a `createdAt` carried by the document wins
/// over the import time.
pub struct NewSnapshot {
    snapshot: Snapshot,
    created_at: String,
    doc: String,
}

impl NewSnapshot {
    pub fn from_doc(doc: &serde_json::Value, now: DateTime<Utc>) -> anyhow::Result<Self> {
        let mut snapshot = Snapshot::parse(doc)?;
        let mut doc = doc.clone();
        if let Some(canonical) = snapshot.canonical_month() {
            snapshot.month = canonical.to_string();
            if let Some(fields) = doc.as_object_mut() {
                fields.insert("month".to_string(), canonical.into());
            }
        }
        let created_at = match snapshot.created_at.as_deref() {
            Some(raw) => stamp(
                DateTime::parse_from_rfc3339(raw)
                    .with_context(|| format!("createdAt is not RFC 3339: {raw}"))?
                    .with_timezone(&Utc),
            ),
            None => stamp(now),
        };
        Ok(Self {
            snapshot,
            created_at,
            doc: serde_json::to_string(&doc)?,
        })
    }
}

pub fn insert_snapshot(conn: &Connection, new: &NewSnapshot) -> anyhow::Result<String> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO attendance_snapshots(id, student_id, year, month, month_index, created_at, doc)
         VALUES(?, ?, ?, ?, ?, ?, ?)",
        (
            &id,
            new.snapshot.student_id.trim(),
            new.snapshot.year,
            new.snapshot.month.trim(),
            new.snapshot.month_index,
            &new.created_at,
            &new.doc,
        ),
    )?;
    Ok(id)
}

pub fn upsert_student(
    conn: &Connection,
    student_id: &str,
    name: Option<&str>,
    education_level: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO students(id, name, education_level, updated_at)
         VALUES(?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
           name = COALESCE(excluded.name, students.name),
           education_level = excluded.education_level,
           updated_at = excluded.updated_at",
        (student_id, name, education_level, stamp(now)),
    )?;
    Ok(())
}

/// Returns false when the course already exists for that level.
pub fn insert_course(conn: &Connection, name: &str, education_level: &str) -> anyhow::Result<bool> {
    let changed = conn.execute(
        "INSERT INTO courses(id, name, education_level)
         VALUES(?, ?, ?)
         ON CONFLICT(name, education_level) DO NOTHING",
        (Uuid::new_v4().to_string(), name, education_level),
    )?;
    Ok(changed > 0)
}
