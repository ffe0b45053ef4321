use crate::workspace::Workspace;
use autopilot_exec::shell_quote;
use autopilot_git::run_tracked;
use autopilot_repair::record_run_score;
use std::path::Path;

/// Returns the command's exit code.
pub fn execute(cwd: &Path, agent: &str, argv: &[String]) -> anyhow::Result<i32> {
    if argv.is_empty() {
        anyhow::bail!("usage: autopilot run -- <command> [args...]");
    }
    let ws = Workspace::open(cwd)?;
    let store = ws.store()?;
    let runner = ws.runner();

    let command = if argv.len() == 1 {
        // a single argument is taken as a full shell line
        argv[0].clone()
    } else {
        argv.iter().map(|a| shell_quote(a)).collect::<Vec<_>>().join(" ")
    };
    let result = run_tracked(&runner, store.as_ref(), agent, &command);
    if let Err(e) = record_run_score(store.as_ref(), agent, &result.output) {
        tracing::warn!(error = %e, "cannot record run score");
    }
    print!("{}", result.output);
    if !result.output.is_empty() && !result.output.ends_with('\n') {
        println!();
    }
    eprintln!("Recorded {agent}: {command} exit={}", result.exit_code);
    Ok(result.exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use autopilot_ledger::LogStore;

    #[test]
    fn run_records_output_score() {
        let tmp = tempfile::tempdir().unwrap();
        autopilot_ledger::init_workspace(tmp.path()).unwrap();

        assert_eq!(execute(tmp.path(), "git", &["echo all good".into()]).unwrap(), 0);
        assert_eq!(execute(tmp.path(), "git", &["echo build error".into()]).unwrap(), 0);

        let ws = Workspace::open(tmp.path()).unwrap();
        let store = ws.store().unwrap();
        let scores: Vec<f64> = store
            .recent_metrics("git", 5)
            .unwrap()
            .iter()
            .filter(|m| m.metric_name == "run_score")
            .map(|m| m.value)
            .collect();
        assert_eq!(scores, [1.0, 0.0]);
        assert_eq!(store.get_recent_logs("git", 5).unwrap().len(), 2);
    }

    #[test]
    fn empty_argv_is_usage_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(execute(tmp.path(), "git", &[]).is_err());
    }
}
