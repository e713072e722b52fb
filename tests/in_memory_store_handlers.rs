use gradebookd::ipc::{handle_request, AppState, Request};
use gradebookd::store::MemoryReportStore;
use serde_json::json;

fn call(state: &mut AppState, method: &str, params: serde_json::Value) -> serde_json::Value {
    let req = Request {
        id: "t".to_string(),
        method: method.to_string(),
        params,
    };
    handle_request(state, req)
}

#[test]
fn handlers_run_against_an_injected_store() {
    let mut state = AppState::with_store(Box::new(MemoryReportStore::new()));

    // No workspace db: sheet defaults apply (3 subjects), so the two-mark row drops.
    let resp = call(
        &mut state,
        "reports.process",
        json!({
            "students": [
                { "name": "Full", "marks": [70, 70, 50] },
                { "name": "Short", "marks": [70, 70] }
            ]
        }),
    );
    assert_eq!(resp["ok"], true, "{}", resp);
    let students = resp["result"]["report"]["students"]
        .as_array()
        .expect("students");
    assert_eq!(students.len(), 1);
    assert_eq!(students[0]["bestSubject"], "Subject 1");
    assert_eq!(students[0]["grade"], "B");

    let stats = call(&mut state, "profile.stats", json!({}));
    assert_eq!(stats["result"], json!({ "totalReports": 1, "totalStudents": 1 }));

    // Settings need a workspace database even when reports do not.
    let setup = call(&mut state, "setup.get", json!({}));
    assert_eq!(setup["error"]["code"], "no_workspace");

    let stored = state
        .store
        .as_ref()
        .expect("store")
        .load()
        .expect("load");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].report.students[0].name, "Full");
}

#[test]
fn bad_params_are_reported_not_panicked() {
    let mut state = AppState::with_store(Box::new(MemoryReportStore::new()));

    let resp = call(&mut state, "reports.process", json!({}));
    assert_eq!(resp["error"]["code"], "bad_params");

    let resp = call(
        &mut state,
        "reports.process",
        json!({ "subjectCount": "three", "students": [] }),
    );
    assert_eq!(resp["error"]["code"], "bad_params");

    let resp = call(&mut state, "reports.process", json!({ "students": "Alice" }));
    assert_eq!(resp["error"]["code"], "bad_params");

    let resp = call(&mut state, "workspace.select", json!({ "path": "  " }));
    assert_eq!(resp["error"]["code"], "bad_params");
}

#[test]
fn workspace_settings_drive_defaults_and_display() {
    let dir = std::env::temp_dir().join(format!("gradebook-settings-{}", unique_suffix()));
    let mut state = AppState::new();
    let resp = call(
        &mut state,
        "workspace.select",
        json!({ "path": dir.to_string_lossy() }),
    );
    assert_eq!(resp["ok"], true, "{}", resp);

    let resp = call(
        &mut state,
        "setup.update",
        json!({ "section": "sheet", "patch": { "defaultSubjectCount": 2 } }),
    );
    assert_eq!(resp["ok"], true, "{}", resp);
    let resp = call(
        &mut state,
        "setup.update",
        json!({ "section": "display", "patch": { "averageDecimals": 0 } }),
    );
    assert_eq!(resp["ok"], true, "{}", resp);
    let resp = call(
        &mut state,
        "setup.update",
        json!({ "section": "display", "patch": { "averageDecimals": 9 } }),
    );
    assert_eq!(resp["error"]["code"], "bad_params");

    let setup = call(&mut state, "setup.get", json!({}));
    assert_eq!(setup["result"]["sheet"]["defaultSubjectCount"], 2);
    assert_eq!(setup["result"]["sheet"]["defaultStudentCount"], 2);
    assert_eq!(setup["result"]["display"]["averageDecimals"], 0);

    let resp = call(
        &mut state,
        "reports.process",
        json!({ "students": [{ "name": "Dee", "marks": [75, 76] }] }),
    );
    assert_eq!(resp["ok"], true, "{}", resp);

    let summary = call(&mut state, "dashboard.summary", json!({}));
    assert_eq!(summary["result"]["rows"][0]["averageDisplay"], "76%");
    assert_eq!(summary["result"]["rows"][0]["remark"], "Very Good");

    drop(state);
    let _ = std::fs::remove_dir_all(dir);
}

fn unique_suffix() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos()
}
