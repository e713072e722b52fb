use crate::calc::Report;
use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredReport {
    pub id: String,
    pub created_at: String,
    pub report: Report,
}

impl StoredReport {
    fn stamp(report: Report) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            report,
        }
    }
}

/// Ordered, append-only history of processed reports.
pub trait ReportStore {
    fn load(&self) -> anyhow::Result<Vec<StoredReport>>;
    fn append(&mut self, report: Report) -> anyhow::Result<StoredReport>;
}

#[derive(Debug, Default)]
pub struct MemoryReportStore {
    reports: Vec<StoredReport>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportStore for MemoryReportStore {
    fn load(&self) -> anyhow::Result<Vec<StoredReport>> {
        Ok(self.reports.clone())
    }

    fn append(&mut self, report: Report) -> anyhow::Result<StoredReport> {
        let stored = StoredReport::stamp(report);
        self.reports.push(stored.clone());
        Ok(stored)
    }
}

/// Reports kept in the workspace database, one JSON body per row.
pub struct SqliteReportStore {
    conn: Connection,
}

impl SqliteReportStore {
    /// `conn` must come from `db::open_db` (or `db::open_in_memory`) so the
    /// `reports` table exists.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

impl ReportStore for SqliteReportStore {
    fn load(&self) -> anyhow::Result<Vec<StoredReport>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, created_at, body FROM reports ORDER BY seq")?;
        let rows = stmt
            .query_map([], |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut out = Vec::with_capacity(rows.len());
        for (id, created_at, body) in rows {
            let report: Report = serde_json::from_str(&body)
                .with_context(|| format!("stored report {} is malformed", id))?;
            out.push(StoredReport {
                id,
                created_at,
                report,
            });
        }
        Ok(out)
    }

    fn append(&mut self, report: Report) -> anyhow::Result<StoredReport> {
        let stored = StoredReport::stamp(report);
        let body = serde_json::to_string(&stored.report).context("failed to encode report")?;

        let tx = self.conn.transaction()?;
        let next_seq: i64 =
            tx.query_row("SELECT COALESCE(MAX(seq), 0) + 1 FROM reports", [], |r| {
                r.get(0)
            })?;
        tx.execute(
            "INSERT INTO reports(id, seq, created_at, body) VALUES(?, ?, ?, ?)",
            (&stored.id, next_seq, &stored.created_at, &body),
        )
        .context("failed to insert report")?;
        tx.commit()?;

        tracing::debug!(report_id = %stored.id, seq = next_seq, "report appended");
        Ok(stored)
    }
}
