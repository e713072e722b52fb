use crate::calc;
use crate::intake::{self, RawStudentRow, SheetShape};
use crate::ipc::error::{calc_err, err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

use super::setup;

fn optional_count(req: &Request, key: &str, default: usize) -> Result<usize, serde_json::Value> {
    match req.params.get(key) {
        None => Ok(default),
        Some(v) if v.is_null() => Ok(default),
        Some(v) => v.as_u64().map(|n| n as usize).ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                format!("{} must be a non-negative integer", key),
                Some(json!({ key: v })),
            )
        }),
    }
}

fn parse_rows(req: &Request) -> Result<Vec<RawStudentRow>, serde_json::Value> {
    let Some(raw) = req.params.get("students") else {
        return Err(err(&req.id, "bad_params", "missing students", None));
    };
    serde_json::from_value(raw.clone()).map_err(|e| {
        err(
            &req.id,
            "bad_params",
            format!("students must be an array of {{name, marks}}: {}", e),
            None,
        )
    })
}

fn handle_reports_process(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (default_subjects, default_students) = setup::sheet_defaults(state.db.as_ref());

    let Some(store) = state.store.as_mut() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let subject_count = match optional_count(req, "subjectCount", default_subjects) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let rows = match parse_rows(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    // Without an explicit count every submitted row is considered.
    let student_count = match optional_count(req, "studentCount", rows.len().max(default_students))
    {
        Ok(v) => v,
        Err(e) => return e,
    };

    let shape = match SheetShape::new(subject_count, student_count) {
        Ok(v) => v,
        Err(e) => return calc_err(&req.id, e),
    };
    let students = match intake::collect_students(shape, &rows) {
        Ok(v) => v,
        Err(e) => return calc_err(&req.id, e),
    };
    let report = match calc::aggregate(&students) {
        Ok(v) => v,
        Err(e) => return calc_err(&req.id, e),
    };

    let stored = match store.append(report) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(error = %e, "report append failed");
            return err(&req.id, "db_insert_failed", format!("{e:#}"), None);
        }
    };

    tracing::info!(
        report_id = %stored.id,
        students = stored.report.students.len(),
        skipped = rows.len().min(shape.student_count) - stored.report.students.len(),
        class_average = stored.report.summary.class_average,
        "report processed"
    );

    ok(
        &req.id,
        json!({
            "reportId": stored.id,
            "createdAt": stored.created_at,
            "report": stored.report,
        }),
    )
}

fn handle_reports_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match store.load() {
        Ok(reports) => ok(&req.id, json!({ "reports": reports })),
        Err(e) => err(&req.id, "db_query_failed", format!("{e:#}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.process" => Some(handle_reports_process(state, req)),
        "reports.list" => Some(handle_reports_list(state, req)),
        _ => None,
    }
}
