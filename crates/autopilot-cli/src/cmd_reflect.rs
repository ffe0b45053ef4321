use crate::workspace::Workspace;
use autopilot_repair::reflect::{reflect, REFLECTION_WINDOW};
use std::path::Path;

pub fn execute(cwd: &Path, agent: &str) -> anyhow::Result<()> {
    let ws = Workspace::open(cwd)?;
    let store = ws.store()?;
    let oracle = ws.classifier_oracle();
    match reflect(oracle.as_ref(), store.as_ref(), agent, REFLECTION_WINDOW)? {
        Some(insight) => println!("{insight}"),
        None => println!("No reflection recorded for {agent}."),
    }
    Ok(())
}
