use autopilot_ledger::{init_workspace, AutopilotPaths};
use std::path::Path;

pub fn execute(cwd: &Path) -> anyhow::Result<()> {
    let existing = AutopilotPaths::discover(cwd);
    if existing.is_initialized() {
        init_workspace(cwd)?;
        println!("Already initialized at {}", existing.autopilot_dir.display());
        return Ok(());
    }
    let paths = init_workspace(cwd)?;
    println!("Initialized autopilot workspace at {}", paths.autopilot_dir.display());
    println!("  config: {}", paths.config_json.display());
    println!("  ledger: {}", paths.ledger_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        execute(tmp.path()).unwrap();
        let paths = AutopilotPaths::discover(tmp.path());
        let before = std::fs::read_to_string(&paths.config_json).unwrap();
        execute(tmp.path()).unwrap();
        assert_eq!(std::fs::read_to_string(&paths.config_json).unwrap(), before);
        assert!(paths.ledger_dir.is_dir());
    }
}
