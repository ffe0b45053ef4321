use crate::workspace::Workspace;
use autopilot_core::ErrorLabel;
use autopilot_ledger::WorkspaceLock;
use autopilot_notify::{dispatch, NotifyConfig, NotifyEvent};
use autopilot_repair::{read_error_logs, Collaborators, CycleOutcome, RepairCycle};
use std::path::Path;

/// Run one cycle. `Ok(true)` only when the build was rebuilt successfully.
pub fn execute(cwd: &Path, log_files: &[String], label: Option<&str>) -> anyhow::Result<bool> {
    let ws = Workspace::open(cwd)?;
    let label = label.map(str::parse::<ErrorLabel>).transpose()?;

    let files = if log_files.is_empty() {
        ws.config.repair.log_files.as_slice()
    } else {
        log_files
    };
    let text = read_error_logs(ws.root(), files, ws.config.repair.log_tail_chars);
    if text.trim().is_empty() {
        println!("No error logs found in: {}", files.join(", "));
        return Ok(false);
    }

    let _lock = if ws.paths.is_initialized() {
        Some(WorkspaceLock::acquire(&ws.paths, "repair")?)
    } else {
        None
    };
    let store = ws.store()?;
    let runner = ws.runner();
    let classifier = ws.classifier_oracle();
    let patcher = ws.patch_oracle();

    let cycle = RepairCycle::new(
        ws.root(),
        &ws.config.repair,
        Collaborators {
            runner: &runner,
            store: store.as_ref(),
            classifier_oracle: classifier.as_ref(),
            patch_oracle: patcher.as_ref(),
        },
    );
    let outcome = match label {
        Some(l) => cycle.run_with_label(&text, l)?,
        None => cycle.run(&text)?,
    };

    print_outcome(&outcome);
    notify(&ws, &outcome);
    Ok(outcome.rebuilt())
}

fn print_outcome(outcome: &CycleOutcome) {
    let label = outcome
        .label
        .map_or_else(|| "-".to_string(), |l| l.to_string());
    println!("Label:  {label}");
    println!("State:  {}", outcome.terminal);
    if let Some(p) = &outcome.patch_path {
        println!("Patch:  {}", p.display());
    }
    if let Some(p) = &outcome.quarantine_path {
        println!("Review: {}", p.display());
    }
    if !outcome.detail.is_empty() {
        println!("Detail: {}", outcome.detail);
    }
}

fn notify(ws: &Workspace, outcome: &CycleOutcome) {
    let Some(label) = outcome.label else {
        return;
    };
    let config = NotifyConfig::load(&ws.paths);
    if config.is_empty() {
        return;
    }
    dispatch(
        &config,
        &NotifyEvent::CycleFinished {
            label: label.to_string(),
            state: outcome.terminal.to_string(),
            rebuilt: outcome.rebuilt(),
            detail: outcome.detail.clone(),
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use autopilot_ledger::LogStore;

    #[test]
    fn no_logs_is_not_a_success() {
        let tmp = tempfile::tempdir().unwrap();
        autopilot_ledger::init_workspace(tmp.path()).unwrap();
        assert!(!execute(tmp.path(), &[], None).unwrap());
    }

    #[test]
    fn bad_label_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(execute(tmp.path(), &[], Some("SyntaxError")).is_err());
    }

    #[test]
    fn env_repair_records_and_returns_false() {
        let tmp = tempfile::tempdir().unwrap();
        autopilot_ledger::init_workspace(tmp.path()).unwrap();
        std::fs::create_dir_all(tmp.path().join("logs")).unwrap();
        std::fs::write(tmp.path().join("logs/api_runtime.log"), "Missing JWT_SECRET").unwrap();

        let rebuilt = execute(tmp.path(), &[], Some("EnvError")).unwrap();
        assert!(!rebuilt);
        let env = std::fs::read_to_string(tmp.path().join(".env")).unwrap();
        assert!(env.contains("JWT_SECRET=<INSERT_VALUE>"));

        let ws = Workspace::open(tmp.path()).unwrap();
        let logs = ws.store().unwrap().get_recent_logs("api", 5).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, "repair:EnvError");
    }
}
