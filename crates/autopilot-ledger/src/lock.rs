use crate::paths::AutopilotPaths;
use autopilot_core::clock::now_rfc3339;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};

/// Exclusive lock on `.autopilot/LOCK`, held for the length of a repair
/// cycle so two cycles never patch the same tree. While held, the file
/// names its holder as `pid=<pid> holder=<name> since=<rfc3339>`.
/// Released and emptied on drop.
pub struct WorkspaceLock {
    file: File,
}

impl WorkspaceLock {
    /// Non-blocking; fails if another process holds the lock, naming that
    /// process when it recorded itself.
    pub fn acquire(paths: &AutopilotPaths, holder: &str) -> anyhow::Result<Self> {
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&paths.lock_file)
            .map_err(|e| {
                anyhow::anyhow!("cannot open lock file {}: {}", paths.lock_file.display(), e)
            })?;

        if file.try_lock_exclusive().is_err() {
            let owner = Self::holder(paths).unwrap_or_else(|| "holder unknown".to_string());
            anyhow::bail!(
                "another autopilot run holds {} ({owner})",
                paths.lock_file.display()
            );
        }

        let info = format!(
            "pid={} holder={holder} since={}\n",
            std::process::id(),
            now_rfc3339()
        );
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(info.as_bytes())?;
        file.flush()?;
        tracing::debug!(holder, lock = %paths.lock_file.display(), "workspace lock acquired");

        Ok(Self { file })
    }

    /// Holder line recorded in the lock file, if any.
    pub fn holder(paths: &AutopilotPaths) -> Option<String> {
        let content = std::fs::read_to_string(&paths.lock_file).ok()?;
        let line = content.trim();
        (!line.is_empty()).then(|| line.to_string())
    }
}

impl Drop for WorkspaceLock {
    fn drop(&mut self) {
        let _ = self.file.set_len(0);
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> (tempfile::TempDir, AutopilotPaths) {
        let tmp = tempfile::tempdir().unwrap();
        let p = AutopilotPaths::discover(tmp.path());
        p.ensure_layout().unwrap();
        (tmp, p)
    }

    #[test]
    fn second_acquire_fails_until_drop() {
        let (_tmp, p) = paths();
        let lock = WorkspaceLock::acquire(&p, "repair").unwrap();
        assert!(WorkspaceLock::acquire(&p, "repair").is_err());
        drop(lock);
        let _again = WorkspaceLock::acquire(&p, "repair").unwrap();
    }

    #[test]
    fn lock_file_names_holder() {
        let (_tmp, p) = paths();
        let lock = WorkspaceLock::acquire(&p, "git-repair").unwrap();
        let line = WorkspaceLock::holder(&p).unwrap();
        assert!(line.starts_with(&format!("pid={} holder=git-repair since=", std::process::id())));

        drop(lock);
        assert_eq!(WorkspaceLock::holder(&p), None);
    }

    #[test]
    fn contention_error_reports_holder() {
        let (_tmp, p) = paths();
        let _lock = WorkspaceLock::acquire(&p, "repair").unwrap();
        let err = WorkspaceLock::acquire(&p, "git-repair").err().unwrap().to_string();
        assert!(err.contains("holder=repair"), "{err}");
        assert!(err.contains(&format!("pid={}", std::process::id())), "{err}");
    }
}
