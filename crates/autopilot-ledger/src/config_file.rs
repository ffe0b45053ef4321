//! Reading and editing `.autopilot/config.json`.
//!
//! Keys are dotted paths into the JSON object (`store.backend`,
//! `repair.build_command`). Writes go through a temp file and rename.

use crate::paths::AutopilotPaths;
use anyhow::Context;
use autopilot_core::AutopilotConfig;
use serde_json::{Map, Value};
use std::io::Write;
use std::path::Path;

/// Typed configuration. Missing file yields defaults.
pub fn load_config(paths: &AutopilotPaths) -> anyhow::Result<AutopilotConfig> {
    if !paths.config_json.exists() {
        return Ok(AutopilotConfig::default());
    }
    let content = std::fs::read_to_string(&paths.config_json)
        .with_context(|| format!("cannot read {}", paths.config_json.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("invalid config in {}", paths.config_json.display()))
}

/// Raw config object. Missing file or non-object content yields an empty map.
pub fn read_config_map(path: &Path) -> anyhow::Result<Map<String, Value>> {
    if !path.exists() {
        return Ok(Map::new());
    }
    let content = std::fs::read_to_string(path)?;
    match serde_json::from_str(&content)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

pub fn write_config_map(path: &Path, config: &Map<String, Value>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    write_atomic(path, json.as_bytes())
}

/// Look up a dotted key.
pub fn get_key<'a>(config: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    let mut parts = key.split('.');
    let mut cur = config.get(parts.next()?)?;
    for part in parts {
        cur = cur.as_object()?.get(part)?;
    }
    Some(cur)
}

/// Set a dotted key, creating intermediate objects. A non-object value in
/// the way is replaced.
pub fn set_key(config: &mut Map<String, Value>, key: &str, value: Value) -> anyhow::Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("invalid config key: {key:?}");
    }
    let (last, parents) = parts
        .split_last()
        .ok_or_else(|| anyhow::anyhow!("empty config key"))?;
    let mut cur = config;
    for part in parents {
        let entry = cur
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        cur = entry
            .as_object_mut()
            .ok_or_else(|| anyhow::anyhow!("cannot descend into {part}"))?;
    }
    cur.insert(last.to_string(), value);
    Ok(())
}

/// Parse a CLI string into bool, integer, float, JSON array/object, or string.
pub fn parse_value(s: &str) -> Value {
    match s {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => {
            if let Ok(n) = s.parse::<i64>() {
                Value::Number(n.into())
            } else if let Ok(f) = s.parse::<f64>() {
                serde_json::json!(f)
            } else if s.starts_with('[') || s.starts_with('{') {
                serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.to_string()))
            } else {
                Value::String(s.to_string())
            }
        }
    }
}

/// Set `key` in the workspace config file, rejecting values the typed
/// schema cannot read back.
pub fn set_config_value(paths: &AutopilotPaths, key: &str, raw: &str) -> anyhow::Result<Value> {
    let mut config = read_config_map(&paths.config_json)?;
    let value = parse_value(raw);
    set_key(&mut config, key, value.clone())?;
    serde_json::from_value::<AutopilotConfig>(Value::Object(config.clone()))
        .with_context(|| format!("{key} = {raw} does not fit the config schema"))?;
    write_config_map(&paths.config_json, &config)?;
    Ok(value)
}

/// Write via temp file in the same directory, then rename over `path`.
pub fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("no parent dir for {}", path.display()))?;
    std::fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path)?;
    Ok(())
}

/// Create `.autopilot/` under `repo_root` with a default config file.
/// Existing config is left alone.
pub fn init_workspace(repo_root: &Path) -> anyhow::Result<AutopilotPaths> {
    let paths = AutopilotPaths::discover(repo_root);
    paths.ensure_layout()?;
    if !paths.config_json.exists() {
        let json = serde_json::to_string_pretty(&AutopilotConfig::default())?;
        write_atomic(&paths.config_json, json.as_bytes())?;
    }
    Ok(paths)
}
