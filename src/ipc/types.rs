use std::path::PathBuf;

use crate::store::ReportStore;
use rusqlite::Connection;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Everything the handlers share between requests. `db` backs workspace
/// settings; `store` holds the report history and is swapped for an
/// in-memory store in tests.
#[derive(Default)]
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub store: Option<Box<dyn ReportStore>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: Box<dyn ReportStore>) -> Self {
        Self {
            workspace: None,
            db: None,
            store: Some(store),
        }
    }
}
