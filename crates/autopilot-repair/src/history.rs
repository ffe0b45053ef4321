use autopilot_core::clock::now_human;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Human-readable trail of repair activity, one `[YYYY-MM-DD HH:MM:SS] msg`
/// line per event in `fix_history.log`. Also emitted through `tracing`.
/// Best-effort: a failed write never interrupts a cycle.
#[derive(Debug, Clone)]
pub struct FixHistory {
    path: PathBuf,
}

impl FixHistory {
    pub fn new(logs_dir: &Path) -> Self {
        Self {
            path: logs_dir.join("fix_history.log"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn log(&self, msg: &str) {
        tracing::info!("{msg}");
        if let Err(e) = self.append(msg) {
            tracing::warn!(path = %self.path.display(), error = %e, "cannot write fix history");
        }
    }

    fn append(&self, msg: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(f, "[{}] {msg}", now_human())
    }
}
