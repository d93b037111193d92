use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::helpers::get_required_array;
use crate::ipc::types::{AppState, Request};
use crate::store::{self, NewSnapshot};
use rusqlite::Connection;
use serde_json::json;

fn db_err(code: &'static str, e: impl std::fmt::Display) -> HandlerErr {
    HandlerErr {
        code,
        message: e.to_string(),
        details: None,
    }
}

fn snapshots_import(
    state: &AppState,
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let docs = get_required_array(params, "snapshots")?;

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| db_err("db_tx_failed", e))?;
    let mut inserted = 0usize;
    let mut rejected: Vec<serde_json::Value> = Vec::new();
    for (index, doc) in docs.iter().enumerate() {
        let new = match NewSnapshot::from_doc(doc, state.clock.now()) {
            Ok(v) => v,
            Err(e) => {
                rejected.push(json!({ "index": index, "message": format!("{:#}", e) }));
                continue;
            }
        };
        store::insert_snapshot(&tx, &new).map_err(|e| HandlerErr {
            code: "db_insert_failed",
            message: e.to_string(),
            details: Some(json!({ "table": "attendance_snapshots", "index": index })),
        })?;
        inserted += 1;
    }
    tx.commit().map_err(|e| db_err("db_commit_failed", e))?;

    if !rejected.is_empty() {
        log::warn!("snapshots.import rejected {} documents", rejected.len());
    }
    log::info!("snapshots.import inserted {} documents", inserted);
    Ok(json!({ "inserted": inserted, "rejected": rejected }))
}

fn students_upsert(
    state: &AppState,
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let students = get_required_array(params, "students")?;

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| db_err("db_tx_failed", e))?;
    let mut upserted = 0usize;
    for (index, s) in students.iter().enumerate() {
        let student_id = s
            .get("studentId")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        let level = s
            .get("educationLevel")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        let (Some(student_id), Some(level)) = (student_id, level) else {
            return Err(HandlerErr {
                code: "bad_params",
                message: "each student needs studentId and educationLevel".to_string(),
                details: Some(json!({ "index": index })),
            });
        };
        let name = s.get("name").and_then(|v| v.as_str());
        store::upsert_student(&tx, student_id, name, level, state.clock.now())
            .map_err(|e| db_err("db_update_failed", e))?;
        upserted += 1;
    }
    tx.commit().map_err(|e| db_err("db_commit_failed", e))?;
    Ok(json!({ "upserted": upserted }))
}

fn courses_import(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let courses = get_required_array(params, "courses")?;

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| db_err("db_tx_failed", e))?;
    let mut inserted = 0usize;
    for (index, c) in courses.iter().enumerate() {
        let name = c.get("name").and_then(|v| v.as_str()).map(str::trim);
        let level = c.get("educationLevel").and_then(|v| v.as_str()).map(str::trim);
        let (Some(name), Some(level)) = (name, level) else {
            return Err(HandlerErr {
                code: "bad_params",
                message: "each course needs name and educationLevel".to_string(),
                details: Some(json!({ "index": index })),
            });
        };
        if name.is_empty() || level.is_empty() {
            continue;
        }
        if store::insert_course(&tx, name, level).map_err(|e| db_err("db_insert_failed", e))? {
            inserted += 1;
        }
    }
    tx.commit().map_err(|e| db_err("db_commit_failed", e))?;
    Ok(json!({ "inserted": inserted }))
}

fn handle_snapshots_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match snapshots_import(state, conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_students_upsert(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match students_upsert(state, conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_courses_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match courses_import(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "snapshots.import" => Some(handle_snapshots_import(state, req)),
        "students.upsert" => Some(handle_students_upsert(state, req)),
        "courses.import" => Some(handle_courses_import(state, req)),
        _ => None,
    }
}
