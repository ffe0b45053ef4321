use crate::workspace::Workspace;
use autopilot_ledger::LogStore;
use autopilot_repair::{evaluate, record_evaluation};
use std::path::Path;

pub fn execute(cwd: &Path, agent: &str, limit: usize) -> anyhow::Result<()> {
    let ws = Workspace::open(cwd)?;
    let store = ws.store()?;
    let logs = store.get_recent_logs(agent, limit)?;
    let eval = evaluate(agent, &logs);
    record_evaluation(store.as_ref(), &eval)?;
    println!(
        "{agent}: score {:.2} ({} ok, {} failed, {} total) [{}]",
        eval.score,
        eval.successes,
        eval.errors,
        eval.total,
        eval.status()
    );
    Ok(())
}
