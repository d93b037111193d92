mod common;

use common::Sidecar;
use serde_json::json;

#[test]
fn header_falls_back_to_latest_year_when_current_month_missing() {
    let mut sidecar = Sidecar::spawn();
    sidecar.open_workspace(
        "attendanced-header-fallback",
        json!([
            {
                "studentId": "STU001", "year": 2024, "month": "December",
                "presentCount": 10, "absentCount": 10, "leaveCount": 0, "attendancePercentage": 50
            },
            {
                "studentId": "STU001", "year": 2025, "month": "June",
                "presentCount": 18, "absentCount": 1, "leaveCount": 1, "attendancePercentage": 90
            }
        ]),
    );

    for method in ["parent.attendance.header", "student.attendance.header"] {
        let header = sidecar.call_ok(
            method,
            json!({ "studentId": "STU001" }),
        );
        assert_eq!(
            header,
            json!({
                "totalClasses": 20,
                "attended": 18,
                "absent": 1,
                "leaves": 1,
                "attendancePercentage": 90.0
            })
        );
    }

    let pinned = sidecar.call_ok(
        "parent.attendance.header",
        json!({ "studentId": "STU001", "year": "2024", "month": "dec" }),
    );
    assert_eq!(pinned["attendancePercentage"], json!(50.0));
}

#[test]
fn unknown_student_gets_zeroed_header_not_error() {
    let mut sidecar = Sidecar::spawn();
    sidecar.open_workspace("attendanced-header-empty", json!([]));

    for method in ["parent.attendance.header", "student.attendance.header"] {
        let header = sidecar.call_ok(
            method,
            json!({ "studentId": "STU404" }),
        );
        assert_eq!(
            header,
            json!({
                "totalClasses": 0,
                "attended": 0,
                "absent": 0,
                "leaves": 0,
                "attendancePercentage": 0.0
            })
        );
    }
}

#[test]
fn leaves_are_counted_from_days_when_leave_count_missing() {
    let mut sidecar = Sidecar::spawn();
    sidecar.open_workspace(
        "attendanced-header-leaves",
        json!([{
            "studentId": "STU001", "year": 2026, "month": "March",
            "presentCount": 15, "absentCount": 2, "attendancePercentage": 75,
            "days": [
                { "date": "2026-03-02", "status": "Present" },
                { "date": "2026-03-03", "status": "Leave" },
                { "date": "2026-03-04", "status": "Leave" },
                { "date": "2026-03-05", "status": "Absent" },
                { "date": "2026-03-06", "status": "Leave" }
            ]
        }]),
    );

    let header = sidecar.call_ok(
        "student.attendance.header",
        json!({ "studentId": "STU001" }),
    );
    assert_eq!(header["leaves"], json!(3));
    assert_eq!(header["attended"], json!(15));
    assert_eq!(header["totalClasses"], json!(20));
}

#[test]
fn summary_shapes_differ_per_portal() {
    let mut sidecar = Sidecar::spawn();
    sidecar.open_workspace(
        "attendanced-summary",
        json!([{
            "studentId": "STU001", "year": 2026, "month": "February",
            "presentCount": 17, "absentCount": 2, "leaveCount": 1, "attendancePercentage": 85
        }]),
    );

    let parent = sidecar.call_ok(
        "parent.attendance.summary",
        json!({ "studentId": "STU001" }),
    );
    assert_eq!(parent, json!({ "present": 17, "absent": 2, "leaves": 1 }));

    let student = sidecar.call_ok(
        "student.attendance.summary",
        json!({ "studentId": "STU001" }),
    );
    assert_eq!(
        student,
        json!({
            "month": "February",
            "year": 2026,
            "totalPresent": 17,
            "totalAbsent": 2,
            "totalLeaves": 1
        })
    );

    let empty = sidecar.call_ok(
        "student.attendance.summary",
        json!({ "studentId": "STU404" }),
    );
    assert_eq!(
        empty,
        json!({
            "month": "March",
            "year": 2026,
            "totalPresent": 0,
            "totalAbsent": 0,
            "totalLeaves": 0
        })
    );
}

#[test]
fn abbreviated_month_matches_current_period() {
    let mut sidecar = Sidecar::spawn();
    sidecar.open_workspace(
        "attendanced-header-abbrev",
        json!([
            { "studentId": "STU001", "year": 2026, "month": "Mar", "attendancePercentage": 70 },
            { "studentId": "STU001", "year": 2026, "month": "April", "attendancePercentage": 90 }
        ]),
    );

    let header = sidecar.call_ok(
        "parent.attendance.header",
        json!({ "studentId": "STU001" }),
    );
    assert_eq!(header["attendancePercentage"], json!(70.0));

    let summary = sidecar.call_ok(
        "student.attendance.summary",
        json!({ "studentId": "STU001" }),
    );
    assert_eq!(summary["month"], json!("March"));
}
