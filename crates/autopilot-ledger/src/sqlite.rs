//! SQLite backend: one table per record stream in a single `ledger.db`
//! opened in WAL mode. Insertion order is the autoincrement `id`.

use crate::record::{Record, Stream};
use crate::store::LogStore;
use autopilot_core::{
    DiagnosticSnapshot, LogEntry, MetricEntry, ReflectionEntry, SnapshotEntry, Status,
    StoreBackend,
};
use rusqlite::{params, Connection, Row};
use std::path::Path;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    agent TEXT NOT NULL,
    action TEXT NOT NULL,
    status TEXT NOT NULL,
    output TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_logs_agent ON logs(agent, id);

CREATE TABLE IF NOT EXISTS metrics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    agent TEXT NOT NULL,
    metric_name TEXT NOT NULL,
    value REAL NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_metrics_agent ON metrics(agent, id);

CREATE TABLE IF NOT EXISTS reflections (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    agent TEXT NOT NULL,
    insight TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS snapshots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    agent TEXT NOT NULL,
    local_branch TEXT NOT NULL,
    remote_branch TEXT,
    ahead INTEGER NOT NULL,
    behind INTEGER NOT NULL,
    staged_count INTEGER NOT NULL,
    unstaged_count INTEGER NOT NULL,
    untracked_count INTEGER NOT NULL,
    is_tracking BOOLEAN NOT NULL,
    is_synced BOOLEAN NOT NULL
);
";

pub struct SqliteStore {
    conn: Connection,
    output_limit: usize,
}

impl SqliteStore {
    /// Open or create the database with full schema.
    pub fn open_or_create(db_path: &Path, output_limit: usize) -> anyhow::Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        let store = Self { conn, output_limit };
        store.apply_pragmas()?;
        store.conn.execute_batch(SCHEMA_SQL)?;
        Ok(store)
    }

    fn apply_pragmas(&self) -> anyhow::Result<()> {
        self.conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    /// Rows are fetched newest-first under the limit, then reversed.
    fn query_tail<T>(
        &self,
        sql: &str,
        agent: &str,
        limit: usize,
        map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
    ) -> anyhow::Result<Vec<T>> {
        let mut stmt = self.conn.prepare(sql)?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut rows = stmt
            .query_map(params![agent, limit], map)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.reverse();
        Ok(rows)
    }
}

impl LogStore for SqliteStore {
    fn append(&self, record: &Record) -> anyhow::Result<()> {
        match record {
            Record::Log(e) => self.conn.execute(
                "INSERT INTO logs (timestamp, agent, action, status, output)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![e.timestamp, e.agent, e.action, e.status.as_str(), e.output],
            )?,
            Record::Metric(e) => self.conn.execute(
                "INSERT INTO metrics (timestamp, agent, metric_name, value)
                 VALUES (?1, ?2, ?3, ?4)",
                params![e.timestamp, e.agent, e.metric_name, e.value],
            )?,
            Record::Reflection(e) => self.conn.execute(
                "INSERT INTO reflections (timestamp, agent, insight) VALUES (?1, ?2, ?3)",
                params![e.timestamp, e.agent, e.insight],
            )?,
            Record::Snapshot(e) => {
                let s = &e.snapshot;
                self.conn.execute(
                    "INSERT INTO snapshots (
                        timestamp, agent, local_branch, remote_branch, ahead, behind,
                        staged_count, unstaged_count, untracked_count, is_tracking, is_synced
                     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                    params![
                        s.timestamp,
                        e.agent,
                        s.local_branch,
                        s.remote_branch,
                        s.ahead,
                        s.behind,
                        s.staged_count,
                        s.unstaged_count,
                        s.untracked_count,
                        s.is_tracking,
                        s.is_synced,
                    ],
                )?
            }
        };
        Ok(())
    }

    fn recent(&self, stream: Stream, agent: &str, limit: usize) -> anyhow::Result<Vec<Record>> {
        match stream {
            Stream::Logs => self.query_tail(
                "SELECT timestamp, agent, action, status, output FROM logs
                 WHERE agent = ?1 ORDER BY id DESC LIMIT ?2",
                agent,
                limit,
                map_log_row,
            ),
            Stream::Metrics => self.query_tail(
                "SELECT timestamp, agent, metric_name, value FROM metrics
                 WHERE agent = ?1 ORDER BY id DESC LIMIT ?2",
                agent,
                limit,
                |row| {
                    Ok(Record::Metric(MetricEntry {
                        timestamp: row.get(0)?,
                        agent: row.get(1)?,
                        metric_name: row.get(2)?,
                        value: row.get(3)?,
                    }))
                },
            ),
            Stream::Reflections => self.query_tail(
                "SELECT timestamp, agent, insight FROM reflections
                 WHERE agent = ?1 ORDER BY id DESC LIMIT ?2",
                agent,
                limit,
                |row| {
                    Ok(Record::Reflection(ReflectionEntry {
                        timestamp: row.get(0)?,
                        agent: row.get(1)?,
                        insight: row.get(2)?,
                    }))
                },
            ),
            Stream::Snapshots => self.query_tail(
                "SELECT timestamp, agent, local_branch, remote_branch, ahead, behind,
                        staged_count, unstaged_count, untracked_count, is_tracking, is_synced
                 FROM snapshots WHERE agent = ?1 ORDER BY id DESC LIMIT ?2",
                agent,
                limit,
                map_snapshot_row,
            ),
        }
    }

    fn backend(&self) -> StoreBackend {
        StoreBackend::Sqlite
    }

    fn output_limit(&self) -> usize {
        self.output_limit
    }
}

fn map_log_row(row: &Row<'_>) -> rusqlite::Result<Record> {
    let status: String = row.get(3)?;
    Ok(Record::Log(LogEntry {
        timestamp: row.get(0)?,
        agent: row.get(1)?,
        action: row.get(2)?,
        // Only this crate writes the column; anything else reads as an error.
        status: Status::parse(&status).unwrap_or(Status::Error),
        output: row.get(4)?,
    }))
}

fn map_snapshot_row(row: &Row<'_>) -> rusqlite::Result<Record> {
    Ok(Record::Snapshot(SnapshotEntry {
        agent: row.get(1)?,
        snapshot: DiagnosticSnapshot {
            timestamp: row.get(0)?,
            local_branch: row.get(2)?,
            remote_branch: row.get(3)?,
            ahead: row.get(4)?,
            behind: row.get(5)?,
            staged_count: row.get(6)?,
            unstaged_count: row.get(7)?,
            untracked_count: row.get(8)?,
            is_tracking: row.get(9)?,
            is_synced: row.get(10)?,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reopen_keeps_rows_and_order() {
        let tmp = tempfile::tempdir().unwrap();
        let db = tmp.path().join("nested/ledger.db");
        {
            let store = SqliteStore::open_or_create(&db, 2000).unwrap();
            store.save_log("api", "first", Status::Success, "").unwrap();
            store.save_log("api", "second", Status::Error, "").unwrap();
        }
        let store = SqliteStore::open_or_create(&db, 2000).unwrap();
        store.save_log("api", "third", Status::Success, "").unwrap();
        let logs = store.get_recent_logs("api", 2).unwrap();
        assert_eq!(logs[0].action, "second");
        assert_eq!(logs[0].status, Status::Error);
        assert_eq!(logs[1].action, "third");
    }

    #[test]
    fn untracked_snapshot_round_trips_null_remote() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SqliteStore::open_or_create(&tmp.path().join("ledger.db"), 2000).unwrap();
        let snap = DiagnosticSnapshot::new("feat/x", None, 0, 0, Default::default());
        store.save_snapshot("git", &snap).unwrap();
        let back = store.recent_snapshots("git", 5).unwrap();
        assert_eq!(back, vec![snap]);
        assert!(back[0].remote_branch.is_none());
    }
}
