use crate::db;
use crate::intake::{MAX_STUDENTS, MAX_SUBJECTS};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use rusqlite::Connection;
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupSection {
    Sheet,
    Display,
}

impl SetupSection {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "sheet" => Some(Self::Sheet),
            "display" => Some(Self::Display),
            _ => None,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Sheet => "setup.sheet",
            Self::Display => "setup.display",
        }
    }
}

fn default_section(section: SetupSection) -> Value {
    match section {
        SetupSection::Sheet => json!({
            "defaultSubjectCount": 3,
            "defaultStudentCount": 2
        }),
        SetupSection::Display => json!({
            "averageDecimals": 2
        }),
    }
}

fn parse_i64_range(v: &Value, key: &str, min: i64, max: i64) -> Result<i64, String> {
    let n = v
        .as_i64()
        .ok_or_else(|| format!("{} must be integer", key))?;
    if !(min..=max).contains(&n) {
        return Err(format!("{} must be in {}..={}", key, min, max));
    }
    Ok(n)
}

fn merge_section_patch(
    section: SetupSection,
    current: &mut Value,
    patch: &Map<String, Value>,
) -> Result<(), String> {
    let obj = current
        .as_object_mut()
        .ok_or_else(|| "internal setup object must be a JSON object".to_string())?;
    for (k, v) in patch {
        let n = match (section, k.as_str()) {
            (SetupSection::Sheet, "defaultSubjectCount") => {
                parse_i64_range(v, k, 1, MAX_SUBJECTS as i64)?
            }
            (SetupSection::Sheet, "defaultStudentCount") => {
                parse_i64_range(v, k, 1, MAX_STUDENTS as i64)?
            }
            (SetupSection::Display, "averageDecimals") => parse_i64_range(v, k, 0, 4)?,
            _ => return Err(format!("unknown setup key: {}", k)),
        };
        obj.insert(k.clone(), Value::from(n));
    }
    Ok(())
}

/// Defaults overlaid with whatever the workspace saved. Without a workspace
/// the defaults are returned as-is.
pub fn load_section(conn: Option<&Connection>, section: SetupSection) -> anyhow::Result<Value> {
    let mut current = default_section(section);
    let Some(conn) = conn else {
        return Ok(current);
    };
    if let Some(saved) = db::settings_get_json(conn, section.key())? {
        if let Some(saved_obj) = saved.as_object() {
            // Malformed historical values fall back to defaults.
            if let Err(msg) = merge_section_patch(section, &mut current, saved_obj) {
                tracing::warn!(section = section.key(), %msg, "ignoring saved setup");
                current = default_section(section);
            }
        }
    }
    Ok(current)
}

fn section_usize(conn: Option<&Connection>, section: SetupSection, key: &str) -> usize {
    let current = load_section(conn, section).unwrap_or_else(|e| {
        tracing::warn!(section = section.key(), error = %e, "setup read failed");
        default_section(section)
    });
    current
        .get(key)
        .and_then(|v| v.as_u64())
        .or_else(|| default_section(section).get(key).and_then(|v| v.as_u64()))
        .unwrap_or(0) as usize
}

/// `(subject_count, student_count)` used when a request leaves them out.
pub fn sheet_defaults(conn: Option<&Connection>) -> (usize, usize) {
    (
        section_usize(conn, SetupSection::Sheet, "defaultSubjectCount"),
        section_usize(conn, SetupSection::Sheet, "defaultStudentCount"),
    )
}

pub fn average_decimals(conn: Option<&Connection>) -> usize {
    section_usize(conn, SetupSection::Display, "averageDecimals")
}

fn handle_setup_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let sheet = match load_section(Some(conn), SetupSection::Sheet) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", format!("{e:#}"), None),
    };
    let display = match load_section(Some(conn), SetupSection::Display) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", format!("{e:#}"), None),
    };

    ok(
        &req.id,
        json!({
            "sheet": sheet,
            "display": display
        }),
    )
}

fn handle_setup_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(section_raw) = req.params.get("section").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing section", None);
    };
    let Some(section) = SetupSection::parse(section_raw) else {
        return err(&req.id, "bad_params", "unknown section", None);
    };
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    let mut current = match load_section(Some(conn), section) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", format!("{e:#}"), None),
    };
    if let Err(msg) = merge_section_patch(section, &mut current, patch_obj) {
        return err(&req.id, "bad_params", msg, None);
    }
    if let Err(e) = db::settings_set_json(conn, section.key(), &current) {
        return err(&req.id, "db_update_failed", format!("{e:#}"), None);
    }
    tracing::info!(section = section.key(), "setup updated");
    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.get" => Some(handle_setup_get(state, req)),
        "setup.update" => Some(handle_setup_update(state, req)),
        _ => None,
    }
}
