use anyhow::anyhow;
use serde::Serialize;
use serde_json::json;

use crate::aggregate::{self, HeaderTotals, ParentSummary, RateSeries};
use crate::attendance::{self, AttendanceQuery, Portal};
use crate::clock::Clock;
use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::helpers::{get_optional_month, get_optional_year, get_required_str};
use crate::ipc::types::{AppState, Request};
use crate::store::SqliteSnapshotStore;

struct QueryParams {
    student_id: String,
    year: Option<i32>,
    month: Option<String>,
}

impl QueryParams {
    fn parse(params: &serde_json::Value) -> Result<Self, HandlerErr> {
        Ok(Self {
            student_id: get_required_str(params, "studentId")?,
            year: get_optional_year(params)?,
            month: get_optional_month(params)?,
        })
    }

    fn query(&self) -> AttendanceQuery<'_> {
        AttendanceQuery {
            student_id: &self.student_id,
            year: self.year,
            month: self.month.as_deref(),
        }
    }
}

fn with_store<T>(
    state: &AppState,
    f: impl FnOnce(&SqliteSnapshotStore<'_>, &dyn Clock) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    let conn = state
        .db
        .as_ref()
        .ok_or_else(|| anyhow!("snapshot store unavailable: no workspace selected"))?;
    let store = SqliteSnapshotStore::new(conn);
    f(&store, state.clock.as_ref())
}

fn to_json<T: Serialize>(value: T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        log::error!("failed to serialize attendance payload: {}", e);
        serde_json::Value::Null
    })
}

/// Parent requests surface unexpected failures as `internal`; student
/// requests log them and answer with the empty payload.
fn respond<T: Serialize>(
    portal: Portal,
    req: &Request,
    result: anyhow::Result<T>,
    empty: impl FnOnce() -> T,
) -> serde_json::Value {
    match result {
        Ok(value) => ok(&req.id, to_json(value)),
        Err(e) => {
            log::error!(
                "{} failed for request {} ({} portal): {:#}",
                req.method,
                req.id,
                portal.name(),
                e
            );
            match portal {
                Portal::Parent => err(&req.id, "internal", e.to_string(), None),
                Portal::Student => ok(&req.id, to_json(empty())),
            }
        }
    }
}

fn handle_header(state: &mut AppState, req: &Request, portal: Portal) -> serde_json::Value {
    let params = match QueryParams::parse(&req.params) {
        Ok(p) => p,
        Err(error) => return error.response(&req.id),
    };
    let result = with_store(state, |store, clock| {
        attendance::header(store, clock, &params.query())
    });
    respond(portal, req, result, HeaderTotals::default)
}

fn handle_rate_series(state: &mut AppState, req: &Request, portal: Portal) -> serde_json::Value {
    let student_id = match get_required_str(&req.params, "studentId") {
        Ok(v) => v,
        Err(error) => return error.response(&req.id),
    };
    let result = with_store(state, |store, clock| {
        attendance::rate_series(store, clock, &student_id)
    });
    let year = state.clock.current_year();
    respond(portal, req, result, || RateSeries::empty(year))
}

fn handle_parent_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let params = match QueryParams::parse(&req.params) {
        Ok(p) => p,
        Err(error) => return error.response(&req.id),
    };
    let result = with_store(state, |store, clock| {
        attendance::parent_summary(store, clock, &params.query())
    });
    respond(Portal::Parent, req, result, ParentSummary::default)
}

fn handle_student_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let params = match QueryParams::parse(&req.params) {
        Ok(p) => p,
        Err(error) => return error.response(&req.id),
    };
    let result = with_store(state, |store, clock| {
        attendance::student_summary(store, clock, &params.query())
    });
    let target = params.query().period(state.clock.as_ref());
    respond(Portal::Student, req, result, || {
        aggregate::student_summary(None, &target.month, target.year)
    })
}

fn handle_subjects(state: &mut AppState, req: &Request, portal: Portal) -> serde_json::Value {
    let params = match QueryParams::parse(&req.params) {
        Ok(p) => p,
        Err(error) => return error.response(&req.id),
    };
    let result = with_store(state, |store, clock| {
        attendance::subjects(store, clock, &params.query(), portal)
    });
    match portal {
        Portal::Parent => respond(
            portal,
            req,
            result.map(|rows| json!({ "subjects": rows })),
            || json!({ "subjects": [] }),
        ),
        Portal::Student => respond(portal, req, result, Vec::new),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "parent.attendance.header" => Some(handle_header(state, req, Portal::Parent)),
        "parent.attendance.monthlyRate" => Some(handle_rate_series(state, req, Portal::Parent)),
        "parent.attendance.summary" => Some(handle_parent_summary(state, req)),
        "parent.attendance.subjectWise" => Some(handle_subjects(state, req, Portal::Parent)),
        "student.attendance.header" => Some(handle_header(state, req, Portal::Student)),
        "student.attendance.yearlyRate" => Some(handle_rate_series(state, req, Portal::Student)),
        "student.attendance.summary" => Some(handle_student_summary(state, req)),
        "student.attendance.subjects" => Some(handle_subjects(state, req, Portal::Student)),
        _ => None,
    }
}
