//! One repair handler per actionable label.
//!
//! A handler only *produces* a fix. Writing patch files, applying them and
//! rebuilding belong to the cycle, so every handler can be exercised
//! without touching a working tree.

use crate::context::SourceContext;
use crate::prompts::{self, NO_PATCH};
use autopilot_core::{ErrorLabel, PatchArtifact, RepairConfig};
use autopilot_oracle::{Oracle, OracleError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// What a handler came up with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fix {
    /// A patch that passed the header check, ready to apply.
    Patch(PatchArtifact),
    /// Patch text (possibly empty) that must not be applied.
    Rejected { text: String, reason: String },
    /// The handler acted directly; there is nothing to apply or rebuild.
    Done { summary: String, success: bool },
}

pub trait RepairHandler {
    fn label(&self) -> ErrorLabel;
    fn produce_fix(&self, log_text: &str) -> Fix;
}

// ── Oracle-driven diff ──

/// Asks the patch oracle for a unified diff using the label's prompt.
/// A reply that is neither a diff nor `NO_PATCH` earns one reinforced
/// re-ask before it is rejected.
pub struct OracleDiffHandler<'a> {
    label: ErrorLabel,
    oracle: &'a dyn Oracle,
    fallback_hint: String,
    context: Option<SourceContext>,
}

/// Outcome of one oracle round trip.
enum Reply {
    Diff(PatchArtifact),
    NoPatch(String),
    Other(String),
}

impl<'a> OracleDiffHandler<'a> {
    pub fn new(label: ErrorLabel, oracle: &'a dyn Oracle, fallback_hint: &str) -> Self {
        Self {
            label,
            oracle,
            fallback_hint: fallback_hint.to_string(),
            context: None,
        }
    }

    /// Quote the source file named in the log into patch prompts.
    pub fn with_context(mut self, context: SourceContext) -> Self {
        self.context = Some(context);
        self
    }

    fn ask(&self, prompt: &str) -> Result<Reply, OracleError> {
        let reply = self.oracle.complete(prompt)?.trim().to_string();
        if reply == NO_PATCH {
            return Ok(Reply::NoPatch(reply));
        }
        let artifact = PatchArtifact::new(reply, &self.fallback_hint);
        if artifact.is_valid {
            Ok(Reply::Diff(artifact))
        } else {
            Ok(Reply::Other(artifact.diff_text))
        }
    }

    fn oracle_failed(&self, text: String, e: &OracleError) -> Fix {
        tracing::warn!(label = %self.label, error = %e, "patch oracle failed");
        Fix::Rejected {
            text,
            reason: format!("patch oracle failed: {e}"),
        }
    }
}

fn no_patch(text: String) -> Fix {
    Fix::Rejected {
        text,
        reason: "oracle found no code change to make".into(),
    }
}

impl RepairHandler for OracleDiffHandler<'_> {
    fn label(&self) -> ErrorLabel {
        self.label
    }

    fn produce_fix(&self, log_text: &str) -> Fix {
        let source = self.context.as_ref().and_then(|c| c.lookup(log_text));
        let first = match self.ask(&prompts::patch(self.label, log_text, source.as_ref())) {
            Ok(Reply::Diff(artifact)) => return Fix::Patch(artifact),
            Ok(Reply::NoPatch(text)) => return no_patch(text),
            Ok(Reply::Other(text)) => text,
            Err(e) => return self.oracle_failed(String::new(), &e),
        };

        tracing::info!(label = %self.label, "reply was not a diff, asking again");
        let prompt = prompts::patch_reinforced(self.label, log_text, &first, source.as_ref());
        match self.ask(&prompt) {
            Ok(Reply::Diff(artifact)) => Fix::Patch(artifact),
            Ok(Reply::NoPatch(text)) => no_patch(text),
            Ok(Reply::Other(text)) => Fix::Rejected {
                text,
                reason: "reply does not start with `diff --git`".into(),
            },
            Err(e) => self.oracle_failed(first, &e),
        }
    }
}

// ── DependencyError ──

/// Nest's "can't resolve dependencies" message names the missing provider
/// as `argument <Name> at index [<n>]`.
fn missing_provider_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"argument (\w+) at index \[\d+\]").ok())
        .as_ref()
}

/// Synthesizes a patch registering the missing provider in the agents
/// module. Falls back to the oracle when the log names no provider.
pub struct DependencyHandler<'a> {
    module_path: String,
    fallback: OracleDiffHandler<'a>,
}

impl<'a> DependencyHandler<'a> {
    pub fn new(module_path: &str, oracle: &'a dyn Oracle) -> Self {
        Self {
            module_path: module_path.to_string(),
            fallback: OracleDiffHandler::new(ErrorLabel::DependencyError, oracle, module_path),
        }
    }

    pub fn with_context(mut self, context: SourceContext) -> Self {
        self.fallback = self.fallback.with_context(context);
        self
    }
}

impl RepairHandler for DependencyHandler<'_> {
    fn label(&self) -> ErrorLabel {
        ErrorLabel::DependencyError
    }

    fn produce_fix(&self, log_text: &str) -> Fix {
        let captured = missing_provider_re()
            .and_then(|re| re.captures(log_text))
            .and_then(|c| c.get(1));
        match captured {
            Some(name) => {
                let diff = provider_patch(&self.module_path, name.as_str());
                tracing::info!(provider = name.as_str(), "templated dependency patch");
                Fix::Patch(PatchArtifact::new(diff, &self.module_path))
            }
            None => {
                tracing::info!("no provider name in log, asking the patch oracle");
                self.fallback.produce_fix(log_text)
            }
        }
    }
}

/// `AgentUploadService` -> `agent-upload`, the Nest file-name stem.
fn service_file_stem(name: &str) -> String {
    let base = name.strip_suffix("Service").filter(|b| !b.is_empty()).unwrap_or(name);
    let mut out = String::with_capacity(base.len() + 4);
    for (i, c) in base.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Unified diff adding `service` to the imports, `providers` and `exports`
/// of the module at `module_path`.
pub fn provider_patch(module_path: &str, service: &str) -> String {
    let stem = service_file_stem(service);
    format!(
        "diff --git a/{module_path} b/{module_path}
--- a/{module_path}
+++ b/{module_path}
@@ -1,5 +1,7 @@
 import {{ Module }} from '@nestjs/common';
 import {{ AgentRunController }} from './agent-run.controller';
+import {{ {service} }} from './services/{stem}.service';
+
 @Module({{
   providers: [
     AgentRunnerService,
+    {service},
     AgentTraceService,
     AgentEvalService,
   ],
@@
   exports: [
     AgentRunnerService,
+    {service},
     AgentTraceService,
     AgentEvalService,
   ],
 }})
 export class AgentsModule {{}}
"
    )
}

// ── EnvError ──

fn missing_var_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Missing\s+([A-Z][A-Z0-9_]*)\b").ok())
        .as_ref()
}

pub const ENV_PLACEHOLDER: &str = "<INSERT_VALUE>";
const ENV_HEADER: &str = "# Auto-added missing variables";

/// Appends `NAME=<INSERT_VALUE>` for each missing variable named in the
/// log. Variables already defined in the file are left alone.
pub struct EnvHandler {
    env_file: PathBuf,
}

impl EnvHandler {
    pub fn new(env_file: impl Into<PathBuf>) -> Self {
        Self {
            env_file: env_file.into(),
        }
    }

    pub fn env_file(&self) -> &Path {
        &self.env_file
    }
}

/// Distinct variable names in first-seen order.
pub fn missing_env_vars(log_text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let Some(re) = missing_var_re() else {
        return names;
    };
    for cap in re.captures_iter(log_text) {
        let name = &cap[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

fn defined_vars(content: &str) -> Vec<&str> {
    content
        .lines()
        .filter_map(|l| {
            let l = l.trim_start();
            let l = l.strip_prefix("export ").unwrap_or(l);
            l.split_once('=').map(|(k, _)| k.trim())
        })
        .collect()
}

impl RepairHandler for EnvHandler {
    fn label(&self) -> ErrorLabel {
        ErrorLabel::EnvError
    }

    fn produce_fix(&self, log_text: &str) -> Fix {
        let wanted = missing_env_vars(log_text);
        if wanted.is_empty() {
            return Fix::Done {
                summary: "no missing variable names found in log".into(),
                success: false,
            };
        }

        let existing = std::fs::read_to_string(&self.env_file).unwrap_or_default();
        let defined = defined_vars(&existing);
        let new: Vec<&String> = wanted
            .iter()
            .filter(|v| !defined.contains(&v.as_str()))
            .collect();
        if new.is_empty() {
            return Fix::Done {
                summary: format!("already defined in {}: {}", self.env_file.display(), wanted.join(", ")),
                success: true,
            };
        }

        let mut block = format!("\n{ENV_HEADER}\n");
        for var in &new {
            block.push_str(&format!("{var}={ENV_PLACEHOLDER}\n"));
        }
        match append(&self.env_file, &block) {
            Ok(()) => {
                let names: Vec<&str> = new.iter().map(|s| s.as_str()).collect();
                Fix::Done {
                    summary: format!("added to {}: {}", self.env_file.display(), names.join(", ")),
                    success: true,
                }
            }
            Err(e) => Fix::Done {
                summary: format!("cannot write {}: {e}", self.env_file.display()),
                success: false,
            },
        }
    }
}

fn append(path: &Path, text: &str) -> std::io::Result<()> {
    use std::io::Write;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut f = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    f.write_all(text.as_bytes())
}

// ── RuntimeError ──

/// Writes the raw log aside for manual triage. Never repairs anything.
pub struct RuntimeHandler {
    log_path: PathBuf,
}

impl RuntimeHandler {
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
        }
    }
}

impl RepairHandler for RuntimeHandler {
    fn label(&self) -> ErrorLabel {
        ErrorLabel::RuntimeError
    }

    fn produce_fix(&self, log_text: &str) -> Fix {
        let written = self
            .log_path
            .parent()
            .map_or(Ok(()), std::fs::create_dir_all)
            .and_then(|_| std::fs::write(&self.log_path, log_text));
        let summary = match written {
            Ok(()) => format!("logged to {} for manual triage", self.log_path.display()),
            Err(e) => format!("cannot write {}: {e}", self.log_path.display()),
        };
        Fix::Done {
            summary,
            success: false,
        }
    }
}

// ── Mapping ──

/// Closed `ErrorLabel -> handler` mapping. `UnknownError` has no handler.
pub struct HandlerSet<'a> {
    build: OracleDiffHandler<'a>,
    dependency: DependencyHandler<'a>,
    env: EnvHandler,
    runtime: RuntimeHandler,
}

impl<'a> HandlerSet<'a> {
    /// Paths in `config` are resolved against `root`.
    pub fn from_config(config: &RepairConfig, root: &Path, patch_oracle: &'a dyn Oracle) -> Self {
        let logs_dir = root.join(&config.logs_dir);
        let context = SourceContext::new(
            vec![root.join(&config.source_dir), root.to_path_buf()],
            config.context_chars,
        );
        Self {
            build: OracleDiffHandler::new(ErrorLabel::BuildError, patch_oracle, "unknown")
                .with_context(context.clone()),
            dependency: DependencyHandler::new(&config.dependency_module, patch_oracle)
                .with_context(context),
            env: EnvHandler::new(root.join(&config.env_file)),
            runtime: RuntimeHandler::new(logs_dir.join("runtime_error.log")),
        }
    }

    pub fn handler_for(&self, label: ErrorLabel) -> Option<&dyn RepairHandler> {
        match label {
            ErrorLabel::BuildError => Some(&self.build),
            ErrorLabel::DependencyError => Some(&self.dependency),
            ErrorLabel::EnvError => Some(&self.env),
            ErrorLabel::RuntimeError => Some(&self.runtime),
            ErrorLabel::UnknownError => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autopilot_oracle::{FailingOracle, StaticOracle};

    const NEST_LOG: &str = "[Nest] ERROR [ExceptionHandler] Nest can't resolve dependencies of the \
        AgentRunController (AgentRunnerService, ?). Please make sure that the argument \
        AgentUploadService at index [1] is available in the AgentsModule context.";

    #[test]
    fn oracle_diff_accepts_header() {
        let oracle = StaticOracle::new("diff --git a/src/a.ts b/src/a.ts\n--- a/src/a.ts\n+++ b/src/a.ts\n");
        let h = OracleDiffHandler::new(ErrorLabel::BuildError, &oracle, "unknown");
        match h.produce_fix("error TS2304") {
            Fix::Patch(p) => assert_eq!(p.path_hint, "src/a.ts"),
            other => panic!("expected patch, got {other:?}"),
        }
    }

    #[test]
    fn oracle_diff_rejects_prose_and_no_patch() {
        let oracle = StaticOracle::new("Sure! Here is the fix you need.");
        let h = OracleDiffHandler::new(ErrorLabel::BuildError, &oracle, "unknown");
        assert!(matches!(h.produce_fix("x"), Fix::Rejected { text, .. } if text.starts_with("Sure!")));
        assert_eq!(oracle.call_count(), 2);

        let oracle = StaticOracle::new("NO_PATCH");
        let h = OracleDiffHandler::new(ErrorLabel::BuildError, &oracle, "unknown");
        assert!(matches!(h.produce_fix("x"), Fix::Rejected { .. }));
        assert_eq!(oracle.call_count(), 1);
    }

    #[test]
    fn prose_reply_gets_one_reinforced_retry() {
        let diff = "diff --git a/src/main.ts b/src/main.ts\n--- a/src/main.ts\n+++ b/src/main.ts\n";
        let oracle = StaticOracle::sequence(vec![
            Ok("You should import bootstrap from ./app.".into()),
            Ok(diff.into()),
        ]);
        let h = OracleDiffHandler::new(ErrorLabel::BuildError, &oracle, "unknown");
        match h.produce_fix("src/main.ts(3,10): error TS2304") {
            Fix::Patch(p) => assert_eq!(p.path_hint, "src/main.ts"),
            other => panic!("expected patch, got {other:?}"),
        }
        let prompts = oracle.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("You should import bootstrap from ./app."));
        assert!(prompts[1].contains("starting from `diff --git`"));
    }

    #[test]
    fn second_prose_reply_is_rejected() {
        let oracle = StaticOracle::sequence(vec![
            Ok("first prose".into()),
            Ok("still prose".into()),
        ]);
        let h = OracleDiffHandler::new(ErrorLabel::BuildError, &oracle, "unknown");
        match h.produce_fix("x") {
            Fix::Rejected { text, reason } => {
                assert_eq!(text, "still prose");
                assert!(reason.contains("diff --git"));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert_eq!(oracle.call_count(), 2);
    }

    #[test]
    fn retry_failure_keeps_first_reply() {
        let oracle = StaticOracle::sequence(vec![
            Ok("first prose".into()),
            Err(OracleError::Transport("timed out".into())),
        ]);
        let h = OracleDiffHandler::new(ErrorLabel::BuildError, &oracle, "unknown");
        match h.produce_fix("x") {
            Fix::Rejected { text, reason } => {
                assert_eq!(text, "first prose");
                assert!(reason.contains("timed out"));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn patch_prompt_carries_named_source_file() {
        let tmp = tempfile::tempdir().unwrap();
        let api = tmp.path().join("apps/api");
        std::fs::create_dir_all(api.join("src/agents")).unwrap();
        std::fs::write(
            api.join("src/agents/agent-run.controller.ts"),
            "export class AgentRunController {}\n",
        )
        .unwrap();

        let oracle = StaticOracle::new("NO_PATCH");
        let set = HandlerSet::from_config(&RepairConfig::default(), tmp.path(), &oracle);
        let h = set.handler_for(ErrorLabel::BuildError).unwrap();
        h.produce_fix("src/agents/agent-run.controller.ts(4,7): error TS2304: Cannot find name 'x'.");

        let prompt = &oracle.prompts()[0];
        assert!(prompt.contains("Here is the code from src/agents/agent-run.controller.ts:"));
        assert!(prompt.contains("export class AgentRunController {}"));
    }

    #[test]
    fn oracle_failure_rejects_with_reason() {
        let oracle = FailingOracle::default();
        let h = OracleDiffHandler::new(ErrorLabel::BuildError, &oracle, "unknown");
        match h.produce_fix("x") {
            Fix::Rejected { text, reason } => {
                assert!(text.is_empty());
                assert!(reason.contains("connection refused"));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn dependency_template_without_oracle() {
        let oracle = FailingOracle::default();
        let h = DependencyHandler::new("apps/api/src/agents/agents.module.ts", &oracle);
        let Fix::Patch(p) = h.produce_fix(NEST_LOG) else {
            panic!("expected templated patch");
        };
        assert!(p.is_valid);
        assert_eq!(p.path_hint, "apps/api/src/agents/agents.module.ts");
        assert!(p.diff_text.contains("from './services/agent-upload.service'"));
        let providers = p.diff_text.find("providers:").unwrap();
        let exports = p.diff_text.find("exports:").unwrap();
        assert!(p.diff_text[providers..exports].contains("+    AgentUploadService,"));
        assert!(p.diff_text[exports..].contains("+    AgentUploadService,"));
    }

    #[test]
    fn dependency_without_capture_asks_oracle() {
        let oracle = StaticOracle::new("I cannot tell");
        let h = DependencyHandler::new("m.ts", &oracle);
        assert!(matches!(h.produce_fix("Cannot find module 'x'"), Fix::Rejected { .. }));
        assert_eq!(oracle.call_count(), 2);
    }

    #[test]
    fn file_stem_kebab_case() {
        assert_eq!(service_file_stem("AgentUploadService"), "agent-upload");
        assert_eq!(service_file_stem("PrismaService"), "prisma");
        assert_eq!(service_file_stem("Service"), "service");
        assert_eq!(service_file_stem("mailer"), "mailer");
    }

    #[test]
    fn env_appends_placeholders_once() {
        let tmp = tempfile::tempdir().unwrap();
        let env = tmp.path().join(".env");
        std::fs::write(&env, "PORT=3000\n").unwrap();
        let h = EnvHandler::new(&env);

        let log = "Error: Missing DATABASE_URL\nMissing JWT_SECRET\nMissing DATABASE_URL\nMissing PORT";
        assert!(matches!(h.produce_fix(log), Fix::Done { success: true, .. }));
        let content = std::fs::read_to_string(&env).unwrap();
        assert_eq!(
            content,
            "PORT=3000\n\n# Auto-added missing variables\nDATABASE_URL=<INSERT_VALUE>\nJWT_SECRET=<INSERT_VALUE>\n"
        );

        // Second run finds everything already defined.
        assert!(matches!(h.produce_fix(log), Fix::Done { success: true, .. }));
        assert_eq!(std::fs::read_to_string(&env).unwrap(), content);
    }

    #[test]
    fn env_without_names_is_unsuccessful() {
        let tmp = tempfile::tempdir().unwrap();
        let h = EnvHandler::new(tmp.path().join(".env"));
        assert!(matches!(
            h.produce_fix("Missing required configuration"),
            Fix::Done { success: false, .. }
        ));
        assert!(!tmp.path().join(".env").exists());
    }

    #[test]
    fn runtime_writes_log() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("logs/runtime_error.log");
        let h = RuntimeHandler::new(&path);
        assert!(matches!(h.produce_fix("TypeError: x is undefined"), Fix::Done { success: false, .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "TypeError: x is undefined");
    }

    #[test]
    fn handler_set_is_closed() {
        let oracle = FailingOracle::default();
        let tmp = tempfile::tempdir().unwrap();
        let set = HandlerSet::from_config(&RepairConfig::default(), tmp.path(), &oracle);
        for label in ErrorLabel::KNOWN {
            assert_eq!(set.handler_for(label).unwrap().label(), label);
        }
        assert!(set.handler_for(ErrorLabel::UnknownError).is_none());
    }
}
