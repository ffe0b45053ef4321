use crate::record::{keep_tail, Record, Stream};
use crate::store::LogStore;
use autopilot_core::{StoreBackend, DEFAULT_OUTPUT_LIMIT};
use std::sync::Mutex;

/// Throwaway in-process store. Contents are lost when it is dropped.
#[derive(Debug)]
pub struct MemoryStore {
    records: Mutex<Vec<Record>>,
    output_limit: usize,
}

impl MemoryStore {
    pub fn new(output_limit: usize) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            output_limit,
        }
    }

    /// Every record in insertion order, across all streams and agents.
    pub fn all(&self) -> Vec<Record> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl LogStore for MemoryStore {
    fn append(&self, record: &Record) -> anyhow::Result<()> {
        self.records
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?
            .push(record.clone());
        Ok(())
    }

    fn recent(&self, stream: Stream, agent: &str, limit: usize) -> anyhow::Result<Vec<Record>> {
        let records = self
            .records
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        let matched = records
            .iter()
            .filter(|r| r.stream() == stream && r.agent() == agent)
            .cloned()
            .collect();
        Ok(keep_tail(matched, limit))
    }

    fn backend(&self) -> StoreBackend {
        StoreBackend::Memory
    }

    fn output_limit(&self) -> usize {
        self.output_limit
    }
}

/// Discards writes and reads back nothing. Lets the pipeline run before a
/// durable backend is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

impl LogStore for NullStore {
    fn append(&self, _record: &Record) -> anyhow::Result<()> {
        Ok(())
    }

    fn recent(&self, _stream: Stream, _agent: &str, _limit: usize) -> anyhow::Result<Vec<Record>> {
        Ok(Vec::new())
    }

    fn backend(&self) -> StoreBackend {
        StoreBackend::Null
    }

    fn output_limit(&self) -> usize {
        DEFAULT_OUTPUT_LIMIT
    }
}
