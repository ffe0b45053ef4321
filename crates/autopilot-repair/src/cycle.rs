//! One repair attempt, from raw log text to a recorded outcome.
//!
//! ```text
//! Idle -> Classified -> PatchRequested -> PatchValidated -> Applied -> Rebuilt
//!             |                |                |             \-> RebuildFailed
//!             |                |                \-> ApplyFailed
//!             |                \-> PatchRejected
//!             \-> Handled                     (env / runtime handlers)
//! every terminal state -> Recorded
//! ```

use crate::classify::Classifier;
use crate::handlers::{Fix, HandlerSet};
use crate::history::FixHistory;
use crate::patch::{apply_patch, display_relative, quarantine, write_patch, ApplyResult};
use crate::REPAIR_AGENT;
use anyhow::bail;
use autopilot_core::{ErrorLabel, RepairConfig, Status};
use autopilot_exec::{mask_secrets, CommandRunner};
use autopilot_ledger::LogStore;
use autopilot_oracle::Oracle;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleState {
    Idle,
    Classified,
    PatchRequested,
    PatchValidated,
    PatchRejected,
    Applied,
    ApplyFailed,
    Rebuilt,
    RebuildFailed,
    /// A handler acted directly (env file append, runtime log).
    Handled,
    Recorded,
}

impl CycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleState::Idle => "idle",
            CycleState::Classified => "classified",
            CycleState::PatchRequested => "patch_requested",
            CycleState::PatchValidated => "patch_validated",
            CycleState::PatchRejected => "patch_rejected",
            CycleState::Applied => "applied",
            CycleState::ApplyFailed => "apply_failed",
            CycleState::Rebuilt => "rebuilt",
            CycleState::RebuildFailed => "rebuild_failed",
            CycleState::Handled => "handled",
            CycleState::Recorded => "recorded",
        }
    }
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Valid transitions ──

const VALID_TRANSITIONS: &[(CycleState, &[CycleState])] = &[
    (CycleState::Idle, &[CycleState::Classified]),
    (
        CycleState::Classified,
        &[
            CycleState::PatchRequested,
            CycleState::Handled,
            // UnknownError: no handler
            CycleState::Recorded,
        ],
    ),
    (
        CycleState::PatchRequested,
        &[CycleState::PatchValidated, CycleState::PatchRejected],
    ),
    (
        CycleState::PatchValidated,
        &[CycleState::Applied, CycleState::ApplyFailed],
    ),
    (
        CycleState::Applied,
        &[CycleState::Rebuilt, CycleState::RebuildFailed],
    ),
    (CycleState::PatchRejected, &[CycleState::Recorded]),
    (CycleState::ApplyFailed, &[CycleState::Recorded]),
    (CycleState::Rebuilt, &[CycleState::Recorded]),
    (CycleState::RebuildFailed, &[CycleState::Recorded]),
    (CycleState::Handled, &[CycleState::Recorded]),
    // Recorded is final
];

fn is_valid_transition(from: CycleState, to: CycleState) -> bool {
    VALID_TRANSITIONS
        .iter()
        .any(|(f, targets)| *f == from && targets.contains(&to))
}

/// States visited so far. Rejects transitions not in the table.
struct Walk {
    states: Vec<CycleState>,
}

impl Walk {
    fn start() -> Self {
        Self {
            states: vec![CycleState::Idle],
        }
    }

    fn current(&self) -> CycleState {
        self.states.last().copied().unwrap_or(CycleState::Idle)
    }

    fn to(&mut self, next: CycleState) -> anyhow::Result<()> {
        let from = self.current();
        if !is_valid_transition(from, next) {
            bail!("invalid repair transition: {from} -> {next}");
        }
        tracing::debug!(%from, to = %next, "repair transition");
        self.states.push(next);
        Ok(())
    }
}

// ── Outcome ──

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleOutcome {
    /// `None` only when the cycle never left `Idle`.
    pub label: Option<ErrorLabel>,
    /// Last state before `Recorded` (or `Idle` for empty input).
    pub terminal: CycleState,
    pub history: Vec<CycleState>,
    pub patch_path: Option<PathBuf>,
    pub quarantine_path: Option<PathBuf>,
    pub detail: String,
    /// Whether the handler's work counts as a successful repair.
    pub success: bool,
}

impl CycleOutcome {
    pub fn rebuilt(&self) -> bool {
        self.terminal == CycleState::Rebuilt
    }

    pub fn recorded(&self) -> bool {
        self.history.last() == Some(&CycleState::Recorded)
    }
}

// ── Cycle ──

/// External collaborators of a cycle, all borrowed for its lifetime.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub runner: &'a dyn CommandRunner,
    pub store: &'a dyn LogStore,
    pub classifier_oracle: &'a dyn Oracle,
    pub patch_oracle: &'a dyn Oracle,
}

pub struct RepairCycle<'a> {
    classifier: Classifier<'a>,
    handlers: HandlerSet<'a>,
    runner: &'a dyn CommandRunner,
    store: &'a dyn LogStore,
    history: FixHistory,
    root: PathBuf,
    reports_dir: PathBuf,
    logs_dir: PathBuf,
    build_command: String,
    agent: String,
}

struct Finish {
    label: ErrorLabel,
    detail: String,
    success: bool,
    rebuild: Option<bool>,
    patch_path: Option<PathBuf>,
    quarantine_path: Option<PathBuf>,
}

impl<'a> RepairCycle<'a> {
    /// `config` paths are resolved against `root`, the repository the
    /// runner operates in.
    pub fn new(root: &Path, config: &RepairConfig, deps: Collaborators<'a>) -> Self {
        let logs_dir = root.join(&config.logs_dir);
        Self {
            classifier: Classifier::new(deps.classifier_oracle, config.excerpt_chars),
            handlers: HandlerSet::from_config(config, root, deps.patch_oracle),
            runner: deps.runner,
            store: deps.store,
            history: FixHistory::new(&logs_dir),
            root: root.to_path_buf(),
            reports_dir: root.join(&config.reports_dir),
            logs_dir,
            build_command: config.build_command.clone(),
            agent: REPAIR_AGENT.to_string(),
        }
    }

    /// Record under a different agent name.
    pub fn with_agent(mut self, agent: &str) -> Self {
        self.agent = agent.to_string();
        self
    }

    pub fn history(&self) -> &FixHistory {
        &self.history
    }

    /// Classify `log_text` and run the matching handler.
    pub fn run(&self, log_text: &str) -> anyhow::Result<CycleOutcome> {
        if log_text.trim().is_empty() {
            return Ok(self.idle());
        }
        self.history.log("classifying error log");
        let label = self.classifier.classify(log_text);
        self.run_with_label(log_text, label)
    }

    /// Skip classification and dispatch on `label` directly.
    pub fn run_with_label(&self, log_text: &str, label: ErrorLabel) -> anyhow::Result<CycleOutcome> {
        if log_text.trim().is_empty() {
            return Ok(self.idle());
        }
        let mut walk = Walk::start();
        walk.to(CycleState::Classified)?;
        self.history.log(&format!("error type: {label}"));

        let Some(handler) = self.handlers.handler_for(label) else {
            self.history.log("unclassified error, manual review required");
            return self.finish(
                walk,
                Finish {
                    label,
                    detail: "unclassified error, manual review required".into(),
                    success: false,
                    rebuild: None,
                    patch_path: None,
                    quarantine_path: None,
                },
            );
        };

        let finish = match handler.produce_fix(log_text) {
            Fix::Done { summary, success } => {
                walk.to(CycleState::Handled)?;
                self.history.log(&summary);
                Finish {
                    label,
                    detail: summary,
                    success,
                    rebuild: None,
                    patch_path: None,
                    quarantine_path: None,
                }
            }
            Fix::Rejected { text, reason } => {
                walk.to(CycleState::PatchRequested)?;
                walk.to(CycleState::PatchRejected)?;
                let quarantine_path = match quarantine(&self.logs_dir, label, &text) {
                    Ok(p) => {
                        self.history.log(&format!(
                            "invalid patch ({reason}), saved to {} for manual review",
                            display_relative(&self.root, &p)
                        ));
                        Some(p)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "cannot quarantine rejected patch");
                        None
                    }
                };
                Finish {
                    label,
                    detail: reason,
                    success: false,
                    rebuild: None,
                    patch_path: None,
                    quarantine_path,
                }
            }
            Fix::Patch(artifact) => {
                walk.to(CycleState::PatchRequested)?;
                walk.to(CycleState::PatchValidated)?;
                self.apply_and_rebuild(&mut walk, label, &artifact.diff_text)?
            }
        };
        self.finish(walk, finish)
    }

    fn apply_and_rebuild(&self, walk: &mut Walk, label: ErrorLabel, diff: &str) -> anyhow::Result<Finish> {
        let mut finish = Finish {
            label,
            detail: String::new(),
            success: false,
            rebuild: None,
            patch_path: None,
            quarantine_path: None,
        };

        let path = match write_patch(&self.reports_dir, label, diff) {
            Ok(p) => p,
            Err(e) => {
                walk.to(CycleState::ApplyFailed)?;
                finish.detail = format!("cannot write patch: {e:#}");
                self.history.log(&finish.detail);
                return Ok(finish);
            }
        };
        let rel = display_relative(&self.root, &path);
        self.history.log(&format!("patch saved to {rel}"));
        finish.patch_path = Some(path.clone());

        match apply_patch(self.runner, &self.root, &path) {
            ApplyResult::Applied => {
                walk.to(CycleState::Applied)?;
                self.history.log("patch applied");
            }
            ApplyResult::CheckFailed(out) | ApplyResult::Failed(out) => {
                walk.to(CycleState::ApplyFailed)?;
                self.history.log("patch could not be applied");
                finish.detail = format!("git apply failed for {rel}: {}", out.trim());
                return Ok(finish);
            }
        }

        self.history.log(&format!("rebuilding: {}", self.build_command));
        let build = self.runner.run(&self.build_command);
        finish.rebuild = Some(build.success);
        if build.success {
            walk.to(CycleState::Rebuilt)?;
            self.history.log("build succeeded after fix");
            finish.success = true;
            finish.detail = format!("applied {rel}, build succeeded");
        } else {
            walk.to(CycleState::RebuildFailed)?;
            self.history.log("build still failing");
            finish.detail = format!("applied {rel}, build failed (exit {})", build.exit_code);
        }
        Ok(finish)
    }

    /// Write the mandatory log entry and metrics, then close the walk.
    fn finish(&self, mut walk: Walk, f: Finish) -> anyhow::Result<CycleOutcome> {
        let terminal = walk.current();
        let action = format!("repair:{}", f.label);
        let output = mask_secrets(&format!("{terminal}: {}", f.detail));
        self.store
            .save_log(&self.agent, &action, Status::from_success(f.success), &output)?;
        self.store
            .save_metric(&self.agent, "repair_success", if f.success { 1.0 } else { 0.0 })?;
        if let Some(ok) = f.rebuild {
            self.store
                .save_metric(&self.agent, "rebuild_success", if ok { 1.0 } else { 0.0 })?;
        }
        walk.to(CycleState::Recorded)?;
        self.history
            .log(&format!("repair cycle finished: {} ({terminal})", f.label));

        Ok(CycleOutcome {
            label: Some(f.label),
            terminal,
            history: walk.states,
            patch_path: f.patch_path,
            quarantine_path: f.quarantine_path,
            detail: f.detail,
            success: f.success,
        })
    }

    fn idle(&self) -> CycleOutcome {
        self.history.log("no error log found, nothing to repair");
        CycleOutcome {
            label: None,
            terminal: CycleState::Idle,
            history: vec![CycleState::Idle],
            patch_path: None,
            quarantine_path: None,
            detail: "empty log text".into(),
            success: false,
        }
    }
}
