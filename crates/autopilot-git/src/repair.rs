use crate::tracked::{run_tracked, GIT_AGENT};
use autopilot_exec::CommandRunner;
use autopilot_ledger::LogStore;

/// Commands that unwind a half-finished merge or rebase and refresh remotes.
/// Each runs regardless of the previous one's outcome.
pub const REPAIR_STEPS: [&str; 4] = [
    "git merge --abort",
    "git rebase --abort",
    "git fetch --all",
    "git reset --merge",
];

pub const REPAIR_METRIC: &str = "repair_success_rate";

#[derive(Debug, Clone, PartialEq)]
pub struct GitRepairReport {
    /// `(command, succeeded)` in execution order.
    pub steps: Vec<(String, bool)>,
    pub success_rate: f64,
}

/// Run [`REPAIR_STEPS`] through tracked execution and record the share that
/// succeeded as `repair_success_rate` for the `git` agent.
pub fn auto_repair_git(runner: &dyn CommandRunner, store: &dyn LogStore) -> GitRepairReport {
    let steps: Vec<(String, bool)> = REPAIR_STEPS
        .iter()
        .map(|cmd| {
            let ok = run_tracked(runner, store, GIT_AGENT, cmd).success;
            (cmd.to_string(), ok)
        })
        .collect();
    let succeeded = steps.iter().filter(|(_, ok)| *ok).count();
    let success_rate = succeeded as f64 / steps.len() as f64;

    if let Err(e) = store.save_metric(GIT_AGENT, REPAIR_METRIC, success_rate) {
        tracing::warn!(error = %e, "failed to record repair metric");
    }
    tracing::info!(succeeded, total = steps.len(), "git repair finished");
    GitRepairReport {
        steps,
        success_rate,
    }
}
