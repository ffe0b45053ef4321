//! Schema of `.autopilot/config.json`. Every field has a default, so an
//! empty or missing file yields a usable configuration.

use crate::error::ParseError;
use crate::types::DEFAULT_OUTPUT_LIMIT;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutopilotConfig {
    pub store: StoreConfig,
    pub exec: ExecConfig,
    pub oracle: OracleConfig,
    pub repair: RepairConfig,
}

// ── Store ──

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// One append-only JSON-lines file per record stream.
    #[default]
    Jsonl,
    /// Single SQLite database with one table per record stream.
    Sqlite,
    /// Process-local, discarded on exit.
    Memory,
    /// Writes are dropped, reads are empty.
    Null,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Jsonl => "jsonl",
            StoreBackend::Sqlite => "sqlite",
            StoreBackend::Memory => "memory",
            StoreBackend::Null => "null",
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreBackend {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jsonl" => Ok(StoreBackend::Jsonl),
            "sqlite" => Ok(StoreBackend::Sqlite),
            "memory" => Ok(StoreBackend::Memory),
            "null" | "none" => Ok(StoreBackend::Null),
            other => Err(ParseError::UnknownBackend(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Max characters kept from a log entry's output.
    pub output_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Jsonl,
            output_limit: DEFAULT_OUTPUT_LIMIT,
        }
    }
}

// ── Exec ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    pub timeout_secs: u64,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self { timeout_secs: 600 }
    }
}

// ── Oracle ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// OpenAI-compatible API root, without the trailing `/chat/completions`.
    pub base_url: String,
    /// Model used for classification and reflection.
    pub model: String,
    /// Model used for patch generation.
    pub patch_model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub temperature: f64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            patch_model: "gpt-4o".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
            temperature: 0.2,
        }
    }
}

// ── Repair ──

/// Paths here are relative to the repository root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    pub build_command: String,
    /// Log files whose tails are concatenated into the cycle input.
    pub log_files: Vec<String>,
    /// Characters read from the end of each log file.
    pub log_tail_chars: usize,
    /// Characters of the input handed to the classifier.
    pub excerpt_chars: usize,
    pub env_file: String,
    /// Module file patched by the dependency handler.
    pub dependency_module: String,
    /// Directory that `src/...` paths in build logs are relative to.
    pub source_dir: String,
    /// Characters of the failing source file sent with a patch request.
    pub context_chars: usize,
    pub reports_dir: String,
    pub logs_dir: String,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            build_command: "pnpm -C apps/api build".to_string(),
            log_files: vec![
                "logs/api_build.log".to_string(),
                "logs/api_runtime.log".to_string(),
            ],
            log_tail_chars: 10_000,
            excerpt_chars: 6_000,
            env_file: ".env".to_string(),
            dependency_module: "apps/api/src/agents/agents.module.ts".to_string(),
            source_dir: "apps/api".to_string(),
            context_chars: 12_000,
            reports_dir: "reports/logs".to_string(),
            logs_dir: "logs".to_string(),
        }
    }
}
