use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no .autopilot/ workspace found at {0}; run `autopilot init` first")]
    NotInitialized(PathBuf),
}
