use autopilot_core::AutopilotConfig;
use autopilot_exec::ShellRunner;
use autopilot_ledger::{load_config, open_store, AutopilotPaths, LogStore};
use autopilot_oracle::{FailingOracle, OpenAiOracle, Oracle};
use std::path::Path;
use std::time::Duration;

/// Repository root, paths and typed config for one command invocation.
pub struct Workspace {
    pub paths: AutopilotPaths,
    pub config: AutopilotConfig,
}

impl Workspace {
    /// Locate `.autopilot/` from `cwd` upward. Without one, `cwd` is the
    /// root and the config is all defaults.
    pub fn open(cwd: &Path) -> anyhow::Result<Self> {
        let root = AutopilotPaths::find_root(cwd).unwrap_or_else(|| cwd.to_path_buf());
        let paths = AutopilotPaths::discover(root);
        let config = load_config(&paths)?;
        Ok(Self { paths, config })
    }

    pub fn root(&self) -> &Path {
        &self.paths.root
    }

    pub fn store(&self) -> anyhow::Result<Box<dyn LogStore>> {
        open_store(&self.config.store, &self.paths)
    }

    pub fn runner(&self) -> ShellRunner {
        ShellRunner::new(
            self.root(),
            Duration::from_secs(self.config.exec.timeout_secs),
        )
    }

    /// Oracle for `model`. Without an API key every call fails, which the
    /// pipeline already treats as a degraded answer.
    pub fn oracle(&self, model: &str) -> Box<dyn Oracle> {
        match OpenAiOracle::from_config(&self.config.oracle, model) {
            Ok(o) => Box::new(o),
            Err(e) => {
                tracing::warn!(error = %e, "oracle unavailable, continuing without it");
                Box::new(FailingOracle::new(e))
            }
        }
    }

    pub fn classifier_oracle(&self) -> Box<dyn Oracle> {
        self.oracle(&self.config.oracle.model)
    }

    pub fn patch_oracle(&self) -> Box<dyn Oracle> {
        self.oracle(&self.config.oracle.patch_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autopilot_core::StoreBackend;

    #[test]
    fn open_without_workspace_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = Workspace::open(tmp.path()).unwrap();
        assert_eq!(ws.root(), tmp.path());
        assert_eq!(ws.config.store.backend, StoreBackend::Jsonl);
        assert!(ws.store().is_err());
    }

    #[test]
    fn open_finds_root_from_subdir() {
        let tmp = tempfile::tempdir().unwrap();
        autopilot_ledger::init_workspace(tmp.path()).unwrap();
        let sub = tmp.path().join("apps/api");
        std::fs::create_dir_all(&sub).unwrap();
        let ws = Workspace::open(&sub).unwrap();
        assert_eq!(ws.root(), tmp.path());
        assert_eq!(ws.runner().cwd(), tmp.path());
        assert!(ws.store().is_ok());
    }
}
