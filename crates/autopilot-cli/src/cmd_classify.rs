use crate::workspace::Workspace;
use autopilot_repair::{read_error_logs, Classifier};
use std::path::Path;

pub fn execute(cwd: &Path, file: Option<&Path>) -> anyhow::Result<()> {
    let ws = Workspace::open(cwd)?;
    let text = match file {
        Some(f) => std::fs::read_to_string(f)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", f.display()))?,
        None => read_error_logs(
            ws.root(),
            &ws.config.repair.log_files,
            ws.config.repair.log_tail_chars,
        ),
    };
    if text.trim().is_empty() {
        anyhow::bail!("no error log text to classify");
    }
    let oracle = ws.classifier_oracle();
    let label = Classifier::new(oracle.as_ref(), ws.config.repair.excerpt_chars).classify(&text);
    println!("{label}");
    Ok(())
}
