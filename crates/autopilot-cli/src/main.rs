mod cmd_classify;
mod cmd_config;
mod cmd_diagnose;
mod cmd_eval;
mod cmd_git_repair;
mod cmd_init;
mod cmd_logs;
mod cmd_notify;
mod cmd_reflect;
mod cmd_repair;
mod cmd_run;
mod workspace;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "autopilot",
    version,
    about = "Diagnose a repository, classify build failures and try to repair them"
)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. debug, autopilot_repair=trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the .autopilot/ workspace with a default config
    Init,
    /// Snapshot git sync state and record it
    Diagnose {
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run a shell command and record its output
    Run {
        /// Agent to record under
        #[arg(long, default_value = "git")]
        agent: String,
        /// Command and arguments (after --)
        #[arg(last = true)]
        argv: Vec<String>,
    },
    /// Classify an error log (default: the configured log files)
    Classify {
        /// Log file to classify
        file: Option<PathBuf>,
    },
    /// Run one repair cycle over the error logs
    Repair {
        /// Log file to read instead of the configured ones (repeatable)
        #[arg(long = "log")]
        logs: Vec<String>,
        /// Skip classification and use this label
        #[arg(long)]
        label: Option<String>,
    },
    /// Show recent records
    Logs {
        #[arg(long, default_value = "api")]
        agent: String,
        /// Record stream: logs, metrics, reflections, snapshots
        #[arg(long, default_value = "logs")]
        stream: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Output as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Ask the oracle to reflect on an agent's recent actions
    Reflect {
        #[arg(long, default_value = "api")]
        agent: String,
    },
    /// Score an agent's recent success ratio and record it
    Eval {
        #[arg(long, default_value = "api")]
        agent: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Abort stuck merges/rebases, fetch and reset
    GitRepair,
    /// Read or edit .autopilot/config.json
    Config {
        #[command(subcommand)]
        cmd: cmd_config::ConfigCmd,
    },
    /// Notification channels
    Notify {
        #[command(subcommand)]
        cmd: cmd_notify::NotifyCmd,
    },
}

fn init_tracing(log_level: &str) {
    // RUST_LOG > --log-level > "info"
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);
    let cwd = std::env::current_dir()?;

    match cli.cmd {
        Command::Init => cmd_init::execute(&cwd),
        Command::Diagnose { json } => cmd_diagnose::execute(&cwd, json),
        Command::Run { agent, argv } => {
            let code = cmd_run::execute(&cwd, &agent, &argv)?;
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Command::Classify { file } => cmd_classify::execute(&cwd, file.as_deref()),
        Command::Repair { logs, label } => {
            if !cmd_repair::execute(&cwd, &logs, label.as_deref())? {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Logs {
            agent,
            stream,
            limit,
            json,
        } => cmd_logs::execute(&cwd, &agent, &stream, limit, json),
        Command::Reflect { agent } => cmd_reflect::execute(&cwd, &agent),
        Command::Eval { agent, limit } => cmd_eval::execute(&cwd, &agent, limit),
        Command::GitRepair => cmd_git_repair::execute(&cwd),
        Command::Config { cmd } => cmd_config::run(cmd, &cwd),
        Command::Notify { cmd } => cmd_notify::run(cmd, &cwd),
    }
}
