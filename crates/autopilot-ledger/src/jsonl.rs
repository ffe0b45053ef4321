use crate::record::{keep_tail, Record, Stream};
use crate::store::LogStore;
use anyhow::Context;
use autopilot_core::StoreBackend;
use fs2::FileExt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// One `<stream>.jsonl` file per record stream under `dir`.
///
/// Each append takes an exclusive lock on the stream file and writes one
/// whole line, so writers from separate processes interleave by line
/// without tearing records.
#[derive(Debug, Clone)]
pub struct JsonlStore {
    dir: PathBuf,
    output_limit: usize,
}

impl JsonlStore {
    pub fn open(dir: impl Into<PathBuf>, output_limit: usize) -> anyhow::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("cannot create {}", dir.display()))?;
        Ok(Self { dir, output_limit })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn stream_file(&self, stream: Stream) -> PathBuf {
        self.dir.join(format!("{}.jsonl", stream.name()))
    }
}

impl LogStore for JsonlStore {
    fn append(&self, record: &Record) -> anyhow::Result<()> {
        let path = self.stream_file(record.stream());
        let mut line = record.to_json()?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("cannot open {}", path.display()))?;
        file.lock_exclusive()?;
        let written = file.write_all(line.as_bytes()).and_then(|_| file.flush());
        let _ = file.unlock();
        written.with_context(|| format!("cannot append to {}", path.display()))
    }

    fn recent(&self, stream: Stream, agent: &str, limit: usize) -> anyhow::Result<Vec<Record>> {
        let path = self.stream_file(stream);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;

        let mut matched = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match Record::from_json(stream, trimmed) {
                Ok(r) if r.agent() == agent => matched.push(r),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(file = %path.display(), line = idx + 1, error = %e, "skipping malformed record");
                }
            }
        }
        Ok(keep_tail(matched, limit))
    }

    fn backend(&self) -> StoreBackend {
        StoreBackend::Jsonl
    }

    fn output_limit(&self) -> usize {
        self.output_limit
    }
}
