use autopilot_ledger::{get_key, read_config_map, set_config_value, AutopilotPaths};
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Set a config value (dotted key, e.g. store.backend)
    Set {
        key: String,
        /// true/false, number, JSON array/object, or string
        value: String,
    },
    /// Get a config value
    Get { key: String },
    /// List all config values
    List,
}

pub fn run(cmd: ConfigCmd, cwd: &Path) -> anyhow::Result<()> {
    let root = AutopilotPaths::find_root(cwd)
        .ok_or_else(|| anyhow::anyhow!("No .autopilot/ workspace found. Run `autopilot init` first."))?;
    let paths = AutopilotPaths::discover(root);
    match cmd {
        ConfigCmd::Set { key, value } => {
            let stored = set_config_value(&paths, &key, &value)?;
            println!("{key} = {stored}");
        }
        ConfigCmd::Get { key } => {
            let config = read_config_map(&paths.config_json)?;
            match get_key(&config, &key) {
                Some(val) => println!("{val}"),
                None => println!("(not set)"),
            }
        }
        ConfigCmd::List => {
            let config = read_config_map(&paths.config_json)?;
            let mut lines = Vec::new();
            flatten("", &serde_json::Value::Object(config), &mut lines);
            if lines.is_empty() {
                println!("(no config set)");
            }
            for (k, v) in lines {
                println!("{k} = {v}");
            }
        }
    }
    Ok(())
}

/// Dotted `key = value` pairs, one per leaf. Arrays count as leaves.
fn flatten(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
    match value {
        serde_json::Value::Object(map) => {
            for (k, v) in map {
                let key = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{prefix}.{k}")
                };
                flatten(&key, v, out);
            }
        }
        leaf => out.push((prefix.to_string(), leaf.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_nested() {
        let v = serde_json::json!({"store": {"backend": "sqlite", "output_limit": 500}, "x": [1]});
        let mut out = Vec::new();
        flatten("", &v, &mut out);
        assert!(out.contains(&("store.backend".into(), "\"sqlite\"".into())));
        assert!(out.contains(&("store.output_limit".into(), "500".into())));
        assert!(out.contains(&("x".into(), "[1]".into())));
    }

    #[test]
    fn set_requires_workspace() {
        let tmp = tempfile::tempdir().unwrap();
        let cmd = ConfigCmd::Set {
            key: "store.backend".into(),
            value: "sqlite".into(),
        };
        assert!(run(cmd, tmp.path()).is_err());
    }

    #[test]
    fn set_validates_schema() {
        let tmp = tempfile::tempdir().unwrap();
        autopilot_ledger::init_workspace(tmp.path()).unwrap();
        let bad = ConfigCmd::Set {
            key: "store.backend".into(),
            value: "postgres".into(),
        };
        assert!(run(bad, tmp.path()).is_err());
        let good = ConfigCmd::Set {
            key: "exec.timeout_secs".into(),
            value: "30".into(),
        };
        run(good, tmp.path()).unwrap();
        let paths = AutopilotPaths::discover(tmp.path());
        let config = autopilot_ledger::load_config(&paths).unwrap();
        assert_eq!(config.exec.timeout_secs, 30);
    }
}
