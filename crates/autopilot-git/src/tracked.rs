use autopilot_core::{CommandResult, DiagnosticSnapshot, Status};
use autopilot_exec::{mask_secrets, CommandRunner};
use autopilot_ledger::LogStore;

/// Agent identity for git diagnostics and repair.
pub const GIT_AGENT: &str = "git";

/// Run `command` and record it as a log entry for `agent`.
///
/// The result is returned unchanged. A store failure is logged and does
/// not affect the result.
pub fn run_tracked(
    runner: &dyn CommandRunner,
    store: &dyn LogStore,
    agent: &str,
    command: &str,
) -> CommandResult {
    let result = runner.run(command);
    let status = Status::from_success(result.success);
    if let Err(e) = store.save_log(agent, command, status, &mask_secrets(&result.output)) {
        tracing::warn!(command, error = %e, "failed to record command");
    }
    if result.success {
        tracing::info!(agent, command, "ok");
    } else {
        tracing::warn!(agent, command, exit_code = result.exit_code, "command failed");
    }
    result
}

/// Persist a snapshot plus its one-line summary as a `diagnostic` log.
pub fn record_diagnostic(store: &dyn LogStore, snapshot: &DiagnosticSnapshot) -> anyhow::Result<()> {
    store.save_snapshot(GIT_AGENT, snapshot)?;
    store.save_log(GIT_AGENT, "diagnostic", Status::Success, &snapshot.summary())?;
    Ok(())
}
