use crate::workspace::Workspace;
use autopilot_git::{record_diagnostic, DiagnosticCollector};
use std::path::Path;

pub fn execute(cwd: &Path, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(cwd)?;
    let store = ws.store()?;
    let runner = ws.runner();

    let snapshot = DiagnosticCollector::new(&runner).collect();
    record_diagnostic(store.as_ref(), &snapshot)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }
    println!("{}", snapshot.summary());
    if !snapshot.is_tracking {
        println!("Branch {} has no upstream.", snapshot.local_branch);
    } else if snapshot.is_synced {
        println!("In sync with {}.", snapshot.remote_branch.as_deref().unwrap_or("upstream"));
    } else {
        println!(
            "Out of sync: {} ahead, {} behind.",
            snapshot.ahead, snapshot.behind
        );
    }
    Ok(())
}
