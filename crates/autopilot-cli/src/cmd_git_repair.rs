use crate::workspace::Workspace;
use autopilot_git::auto_repair_git;
use autopilot_ledger::WorkspaceLock;
use autopilot_notify::{dispatch, NotifyConfig, NotifyEvent};
use std::path::Path;

pub fn execute(cwd: &Path) -> anyhow::Result<()> {
    let ws = Workspace::open(cwd)?;
    let store = ws.store()?;
    let _lock = if ws.paths.is_initialized() {
        Some(WorkspaceLock::acquire(&ws.paths, "git-repair")?)
    } else {
        None
    };
    let runner = ws.runner();

    let report = auto_repair_git(&runner, store.as_ref());
    for (cmd, ok) in &report.steps {
        println!("  {}  {cmd}", if *ok { "OK " } else { "ERR" });
    }
    println!("Success rate: {:.2}", report.success_rate);

    dispatch(
        &NotifyConfig::load(&ws.paths),
        &NotifyEvent::GitRepaired {
            success_rate: report.success_rate,
        },
    );
    Ok(())
}
