use autopilot_ledger::AutopilotPaths;
use autopilot_notify::{test_channels, NotifyConfig};
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum NotifyCmd {
    /// Send a test notification to every configured channel
    Test,
    /// Show configured channels
    Status,
}

pub fn run(cmd: NotifyCmd, cwd: &Path) -> anyhow::Result<()> {
    let root = AutopilotPaths::find_root(cwd).unwrap_or_else(|| cwd.to_path_buf());
    let config = NotifyConfig::load(&AutopilotPaths::discover(root));

    if config.is_empty() {
        println!("No notification channels configured.");
        println!();
        println!("Add channels under \"notify_channels\":");
        println!(
            "  autopilot config set notify_channels '[{{\"type\":\"ntfy\",\"url\":\"https://ntfy.sh/my-topic\",\"events\":[\"*\"]}}]'"
        );
        return Ok(());
    }

    match cmd {
        NotifyCmd::Test => {
            println!("Sending test notification to {} channel(s)...", config.channels.len());
            for (name, result) in test_channels(&config) {
                match result {
                    Ok(()) => println!("  OK  {name}"),
                    Err(e) => println!("  ERR {name}: {e}"),
                }
            }
        }
        NotifyCmd::Status => {
            println!("{} channel(s) configured:", config.channels.len());
            for ch in &config.channels {
                println!("  - {}", ch.display_name());
            }
        }
    }
    Ok(())
}
