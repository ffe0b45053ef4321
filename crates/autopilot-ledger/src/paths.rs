use crate::record::Stream;
use std::path::{Path, PathBuf};

/// Well-known paths under `.autopilot/`.
#[derive(Debug, Clone)]
pub struct AutopilotPaths {
    pub root: PathBuf,
    pub autopilot_dir: PathBuf,
    pub ledger_dir: PathBuf,
    pub ledger_db: PathBuf,
    pub lock_file: PathBuf,
    pub config_json: PathBuf,
}

impl AutopilotPaths {
    /// Derive all paths from a repo root. Pure computation, no I/O.
    pub fn discover(repo_root: impl Into<PathBuf>) -> Self {
        let root = repo_root.into();
        let autopilot_dir = root.join(".autopilot");
        let ledger_dir = autopilot_dir.join("ledger");
        Self {
            ledger_db: ledger_dir.join("ledger.db"),
            lock_file: autopilot_dir.join("LOCK"),
            config_json: autopilot_dir.join("config.json"),
            ledger_dir,
            autopilot_dir,
            root,
        }
    }

    /// Create required directories. Idempotent.
    pub fn ensure_layout(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.ledger_dir)?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.autopilot_dir.is_dir()
    }

    /// JSON-lines file backing one record stream.
    pub fn stream_file(&self, stream: Stream) -> PathBuf {
        self.ledger_dir.join(format!("{}.jsonl", stream.name()))
    }

    /// Resolve a repo-relative path from configuration.
    pub fn resolve(&self, rel: impl AsRef<Path>) -> PathBuf {
        let rel = rel.as_ref();
        if rel.is_absolute() {
            rel.to_path_buf()
        } else {
            self.root.join(rel)
        }
    }

    /// Walk up from `start` looking for a directory containing `.autopilot/`.
    pub fn find_root(start: &Path) -> Option<PathBuf> {
        let mut cur = start.to_path_buf();
        loop {
            if cur.join(".autopilot").is_dir() {
                return Some(cur);
            }
            if !cur.pop() {
                return None;
            }
        }
    }
}
