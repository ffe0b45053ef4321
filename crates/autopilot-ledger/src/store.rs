use crate::error::StoreError;
use crate::jsonl::JsonlStore;
use crate::memory::{MemoryStore, NullStore};
use crate::paths::AutopilotPaths;
use crate::record::{Record, Stream};
use crate::sqlite::SqliteStore;
use autopilot_core::{
    DiagnosticSnapshot, LogEntry, MetricEntry, ReflectionEntry, SnapshotEntry, Status,
    StoreBackend, StoreConfig,
};

/// Append-only store for logs, metrics, reflections and snapshots.
///
/// Backends implement `append` and `recent`; the typed helpers are shared.
/// `recent` returns the last `limit` records of `stream` whose agent equals
/// `agent`, oldest first.
pub trait LogStore {
    fn append(&self, record: &Record) -> anyhow::Result<()>;

    fn recent(&self, stream: Stream, agent: &str, limit: usize) -> anyhow::Result<Vec<Record>>;

    fn backend(&self) -> StoreBackend;

    /// Max characters kept from a log entry's output.
    fn output_limit(&self) -> usize;

    fn save_log(&self, agent: &str, action: &str, status: Status, output: &str) -> anyhow::Result<()> {
        let entry = LogEntry::new(agent, action, status, output, self.output_limit());
        self.append(&Record::Log(entry))
    }

    fn save_metric(&self, agent: &str, metric_name: &str, value: f64) -> anyhow::Result<()> {
        self.append(&Record::Metric(MetricEntry::new(agent, metric_name, value)))
    }

    fn save_reflection(&self, agent: &str, insight: &str) -> anyhow::Result<()> {
        self.append(&Record::Reflection(ReflectionEntry::new(agent, insight)))
    }

    fn save_snapshot(&self, agent: &str, snapshot: &DiagnosticSnapshot) -> anyhow::Result<()> {
        self.append(&Record::Snapshot(SnapshotEntry {
            agent: agent.to_string(),
            snapshot: snapshot.clone(),
        }))
    }

    fn get_recent_logs(&self, agent: &str, limit: usize) -> anyhow::Result<Vec<LogEntry>> {
        Ok(self
            .recent(Stream::Logs, agent, limit)?
            .into_iter()
            .filter_map(|r| match r {
                Record::Log(e) => Some(e),
                _ => None,
            })
            .collect())
    }

    fn recent_metrics(&self, agent: &str, limit: usize) -> anyhow::Result<Vec<MetricEntry>> {
        Ok(self
            .recent(Stream::Metrics, agent, limit)?
            .into_iter()
            .filter_map(|r| match r {
                Record::Metric(e) => Some(e),
                _ => None,
            })
            .collect())
    }

    fn recent_reflections(&self, agent: &str, limit: usize) -> anyhow::Result<Vec<ReflectionEntry>> {
        Ok(self
            .recent(Stream::Reflections, agent, limit)?
            .into_iter()
            .filter_map(|r| match r {
                Record::Reflection(e) => Some(e),
                _ => None,
            })
            .collect())
    }

    fn recent_snapshots(&self, agent: &str, limit: usize) -> anyhow::Result<Vec<DiagnosticSnapshot>> {
        Ok(self
            .recent(Stream::Snapshots, agent, limit)?
            .into_iter()
            .filter_map(|r| match r {
                Record::Snapshot(e) => Some(e.snapshot),
                _ => None,
            })
            .collect())
    }
}

/// Open the backend named by `config`. Durable backends require an
/// initialised workspace.
pub fn open_store(config: &StoreConfig, paths: &AutopilotPaths) -> anyhow::Result<Box<dyn LogStore>> {
    let limit = config.output_limit;
    let store: Box<dyn LogStore> = match config.backend {
        StoreBackend::Jsonl => {
            require_workspace(paths)?;
            Box::new(JsonlStore::open(&paths.ledger_dir, limit)?)
        }
        StoreBackend::Sqlite => {
            require_workspace(paths)?;
            Box::new(SqliteStore::open_or_create(&paths.ledger_db, limit)?)
        }
        StoreBackend::Memory => Box::new(MemoryStore::new(limit)),
        StoreBackend::Null => Box::new(NullStore),
    };
    tracing::debug!(backend = %config.backend, "store opened");
    Ok(store)
}

fn require_workspace(paths: &AutopilotPaths) -> anyhow::Result<()> {
    if paths.is_initialized() {
        Ok(())
    } else {
        Err(StoreError::NotInitialized(paths.root.clone()).into())
    }
}
