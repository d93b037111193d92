use anyhow::Context;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

pub const DB_FILE: &str = "attendance.sqlite3";

pub fn open_db(workspace: &Path, busy_timeout: Duration) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace).with_context(|| {
        format!(
            "failed to create workspace {}",
            workspace.to_string_lossy()
        )
    })?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.to_string_lossy()))?;
    conn.busy_timeout(busy_timeout)?;

    // Snapshots are stored as the ingested document plus the columns the
    // resolver filters and orders on. Uniqueness per (student, year, month)
    // is intentionally not enforced.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS attendance_snapshots(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            year INTEGER NOT NULL,
            month TEXT NOT NULL,
            month_index INTEGER,
            created_at TEXT NOT NULL,
            doc TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendance_snapshots_student
         ON attendance_snapshots(student_id, year)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            name TEXT,
            education_level TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS courses(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            education_level TEXT NOT NULL,
            UNIQUE(name, education_level)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_courses_level ON courses(education_level)",
        [],
    )?;

    Ok(conn)
}
