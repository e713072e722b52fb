use crate::calc::{self, CombinedSummary, Grade, GradedStudent};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::StoredReport;
use serde_json::json;

use super::setup;

const NO_DATA_MESSAGE: &str = "No data available yet. Create some reports to see statistics.";

/// Ties round away from zero, so 66.125 shows as "66.13%".
fn format_percent(value: f64, decimals: usize) -> String {
    let scale = 10f64.powi(decimals as i32);
    format!("{:.*}%", decimals, (value * scale).round() / scale)
}

fn grade_class(grade: Grade) -> String {
    format!("grade-{}", grade.label().replace('+', "-plus"))
}

fn student_row(s: &GradedStudent, decimals: usize) -> serde_json::Value {
    let best_subject = if s.best_subject.trim().is_empty() {
        "N/A"
    } else {
        s.best_subject.as_str()
    };
    json!({
        "name": s.name,
        "averageDisplay": format_percent(s.average, decimals),
        "grade": s.grade,
        "gradeClass": grade_class(s.grade),
        "bestSubject": best_subject,
        "remark": s.remark.label(),
    })
}

fn load_reports(state: &AppState, req: &Request) -> Result<Vec<StoredReport>, serde_json::Value> {
    let Some(store) = state.store.as_ref() else {
        return Err(err(&req.id, "no_workspace", "select a workspace first", None));
    };
    store
        .load()
        .map_err(|e| err(&req.id, "db_query_failed", format!("{e:#}"), None))
}

fn handle_dashboard_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let reports = match load_reports(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let decimals = setup::average_decimals(state.db.as_ref());

    let combined = calc::combine(reports.iter().map(|r| &r.report));
    let mut out = match serde_json::to_value(&combined) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "encode_failed", e.to_string(), None),
    };

    match &combined {
        CombinedSummary::NoData => {
            out["message"] = json!(NO_DATA_MESSAGE);
            out["rows"] = json!([]);
        }
        CombinedSummary::Data(stats) => {
            out["classAverageDisplay"] = json!(format_percent(stats.class_average, decimals));
            out["rows"] = stats
                .all_students
                .iter()
                .map(|s| student_row(s, decimals))
                .collect::<serde_json::Value>();
        }
    }

    ok(&req.id, out)
}

fn handle_profile_stats(state: &mut AppState, req: &Request) -> serde_json::Value {
    let reports = match load_reports(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let stats = calc::profile_stats(reports.iter().map(|r| &r.report));
    ok(&req.id, json!(stats))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dashboard.summary" => Some(handle_dashboard_summary(state, req)),
        "profile.stats" => Some(handle_profile_stats(state, req)),
        _ => None,
    }
}
