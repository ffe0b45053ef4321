use crate::prompts;
use autopilot_ledger::LogStore;
use autopilot_oracle::Oracle;

/// Log entries fed to a reflection by default.
pub const REFLECTION_WINDOW: usize = 5;

/// Ask the oracle to review the agent's last `window` log entries and store
/// its answer as a reflection.
///
/// Returns `Ok(None)` without writing anything when there are no logs or the
/// oracle fails. Store errors propagate.
pub fn reflect(
    oracle: &dyn Oracle,
    store: &dyn LogStore,
    agent: &str,
    window: usize,
) -> anyhow::Result<Option<String>> {
    let logs = store.get_recent_logs(agent, window)?;
    if logs.is_empty() {
        tracing::info!(agent, "no logs to reflect on");
        return Ok(None);
    }
    let history = logs
        .iter()
        .map(|l| format!("{} -> {}: {}", l.timestamp, l.action, l.status))
        .collect::<Vec<_>>()
        .join("\n");

    let insight = match oracle.complete(&prompts::reflection(&history)) {
        Ok(reply) => reply.trim().to_string(),
        Err(e) => {
            tracing::warn!(agent, error = %e, "reflection oracle failed");
            return Ok(None);
        }
    };
    if insight.is_empty() {
        return Ok(None);
    }
    store.save_reflection(agent, &insight)?;
    tracing::info!(agent, entries = logs.len(), "reflection saved");
    Ok(Some(insight))
}
