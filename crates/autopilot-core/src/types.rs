use crate::clock::now_rfc3339;
use crate::text::truncate_chars;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default cap on `LogEntry.output`, in characters.
pub const DEFAULT_OUTPUT_LIMIT: usize = 2000;

/// Literal prefix every applicable patch must start with.
pub const DIFF_HEADER: &str = "diff --git";

/// Result of one shell invocation. Never represents a raised error:
/// spawn failures and timeouts are folded into `success = false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    /// Combined stdout followed by stderr.
    pub output: String,
    pub success: bool,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            success: true,
            exit_code: 0,
        }
    }

    pub fn failed(output: impl Into<String>, exit_code: i32) -> Self {
        Self {
            output: output.into(),
            success: false,
            exit_code,
        }
    }

    /// Output with surrounding whitespace removed.
    pub fn trimmed(&self) -> &str {
        self.output.trim()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Error,
}

impl Status {
    pub fn from_success(success: bool) -> Self {
        if success {
            Status::Success
        } else {
            Status::Error
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Status::Success),
            "error" => Some(Status::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Working-tree file counters from the three listing commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeCounts {
    pub staged: u32,
    pub unstaged: u32,
    pub untracked: u32,
}

/// Point-in-time reading of repository synchronization state.
///
/// Invariants, upheld by [`DiagnosticSnapshot::new`]:
/// `is_synced == (ahead == 0 && behind == 0)` and
/// `remote_branch.is_none() => !is_tracking`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticSnapshot {
    pub timestamp: String,
    pub local_branch: String,
    pub remote_branch: Option<String>,
    pub ahead: u32,
    pub behind: u32,
    pub staged_count: u32,
    pub unstaged_count: u32,
    pub untracked_count: u32,
    pub is_tracking: bool,
    pub is_synced: bool,
}

impl DiagnosticSnapshot {
    /// Build a snapshot stamped now. Without an upstream, ahead/behind are
    /// forced to zero.
    pub fn new(
        local_branch: impl Into<String>,
        remote_branch: Option<String>,
        ahead: u32,
        behind: u32,
        tree: TreeCounts,
    ) -> Self {
        let is_tracking = remote_branch.is_some();
        let (ahead, behind) = if is_tracking { (ahead, behind) } else { (0, 0) };
        Self {
            timestamp: now_rfc3339(),
            local_branch: local_branch.into(),
            remote_branch,
            ahead,
            behind,
            staged_count: tree.staged,
            unstaged_count: tree.unstaged,
            untracked_count: tree.untracked,
            is_tracking,
            is_synced: ahead == 0 && behind == 0,
        }
    }

    /// True when both snapshots describe the same repository state.
    pub fn same_state(&self, other: &DiagnosticSnapshot) -> bool {
        let mut a = self.clone();
        a.timestamp = other.timestamp.clone();
        &a == other
    }

    pub fn is_clean(&self) -> bool {
        self.staged_count == 0 && self.unstaged_count == 0 && self.untracked_count == 0
    }

    /// One-line summary stored alongside the structured record.
    pub fn summary(&self) -> String {
        format!(
            "Local: {} | Remote: {} | Ahead: {} | Behind: {} | Staged: {} | Unstaged: {} | Untracked: {}",
            self.local_branch,
            self.remote_branch.as_deref().unwrap_or("none"),
            self.ahead,
            self.behind,
            self.staged_count,
            self.unstaged_count,
            self.untracked_count,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub agent: String,
    pub action: String,
    pub status: Status,
    pub output: String,
}

impl LogEntry {
    /// New entry stamped now, with `output` cut to `output_limit` chars.
    pub fn new(agent: &str, action: &str, status: Status, output: &str, output_limit: usize) -> Self {
        Self {
            timestamp: now_rfc3339(),
            agent: agent.to_string(),
            action: action.to_string(),
            status,
            output: truncate_chars(output, output_limit),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEntry {
    pub timestamp: String,
    pub agent: String,
    pub metric_name: String,
    pub value: f64,
}

impl MetricEntry {
    pub fn new(agent: &str, metric_name: &str, value: f64) -> Self {
        Self {
            timestamp: now_rfc3339(),
            agent: agent.to_string(),
            metric_name: metric_name.to_string(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectionEntry {
    pub timestamp: String,
    pub agent: String,
    pub insight: String,
}

impl ReflectionEntry {
    pub fn new(agent: &str, insight: &str) -> Self {
        Self {
            timestamp: now_rfc3339(),
            agent: agent.to_string(),
            insight: insight.to_string(),
        }
    }
}

/// A persisted snapshot, tagged with the agent that collected it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub agent: String,
    #[serde(flatten)]
    pub snapshot: DiagnosticSnapshot,
}

/// Candidate patch text. Validity is only the header-prefix check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchArtifact {
    pub path_hint: String,
    pub diff_text: String,
    pub is_valid: bool,
}

impl PatchArtifact {
    /// Wrap `diff_text`. The path hint is taken from the first
    /// `diff --git a/<path>` header when present, else `fallback_hint`.
    pub fn new(diff_text: impl Into<String>, fallback_hint: &str) -> Self {
        let diff_text = diff_text.into();
        let is_valid = has_diff_header(&diff_text);
        let path_hint = header_path(&diff_text).unwrap_or_else(|| fallback_hint.to_string());
        Self {
            path_hint,
            diff_text,
            is_valid,
        }
    }
}

/// Shape check: does the text begin with the literal `diff --git` marker?
/// Deliberately shallow; a malformed body after the marker still passes.
pub fn has_diff_header(text: &str) -> bool {
    text.starts_with(DIFF_HEADER)
}

fn header_path(text: &str) -> Option<String> {
    let line = text.lines().find(|l| l.starts_with(DIFF_HEADER))?;
    let rest = line[DIFF_HEADER.len()..].trim();
    let first = rest.split_whitespace().next()?;
    let path = first.strip_prefix("a/").unwrap_or(first);
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(staged: u32, unstaged: u32, untracked: u32) -> TreeCounts {
        TreeCounts {
            staged,
            unstaged,
            untracked,
        }
    }

    #[test]
    fn snapshot_synced_iff_zero_counts() {
        let s = DiagnosticSnapshot::new("main", Some("origin/main".into()), 0, 0, tree(0, 0, 0));
        assert!(s.is_synced);
        assert!(s.is_tracking);

        let s = DiagnosticSnapshot::new("main", Some("origin/main".into()), 2, 0, tree(0, 0, 0));
        assert!(!s.is_synced);
        assert_eq!(s.ahead, 2);
    }

    #[test]
    fn snapshot_without_upstream_is_untracked() {
        let s = DiagnosticSnapshot::new("feat/x", None, 3, 1, tree(1, 2, 3));
        assert!(!s.is_tracking);
        assert_eq!((s.ahead, s.behind), (0, 0));
        assert!(s.is_synced);
        assert_eq!(s.untracked_count, 3);
    }

    #[test]
    fn same_state_ignores_timestamp() {
        let a = DiagnosticSnapshot::new("main", None, 0, 0, tree(1, 0, 0));
        let mut b = a.clone();
        b.timestamp = "2000-01-01T00:00:00Z".into();
        assert!(a.same_state(&b));
        b.staged_count = 2;
        assert!(!a.same_state(&b));
    }

    #[test]
    fn summary_names_missing_remote() {
        let s = DiagnosticSnapshot::new("main", None, 0, 0, tree(0, 1, 0));
        let line = s.summary();
        assert!(line.contains("Remote: none"));
        assert!(line.contains("Unstaged: 1"));
    }

    #[test]
    fn log_entry_truncates_output() {
        let long = "x".repeat(5000);
        let e = LogEntry::new("git", "git status", Status::Success, &long, DEFAULT_OUTPUT_LIMIT);
        assert_eq!(e.output.chars().count(), DEFAULT_OUTPUT_LIMIT);
    }

    #[test]
    fn patch_shape_check_is_prefix_only() {
        assert!(PatchArtifact::new("diff --git garbage that git would refuse", "x").is_valid);
        assert!(!PatchArtifact::new("Here is the fix:\ndiff --git a/x b/x", "x").is_valid);
        assert!(!PatchArtifact::new(" diff --git a/x b/x", "x").is_valid);
        assert!(!PatchArtifact::new("", "x").is_valid);
    }

    #[test]
    fn patch_path_hint_from_header() {
        let p = PatchArtifact::new("diff --git a/src/app/page.tsx b/src/app/page.tsx\n", "fallback");
        assert_eq!(p.path_hint, "src/app/page.tsx");
        let p = PatchArtifact::new("no header here", "fallback");
        assert_eq!(p.path_hint, "fallback");
    }

    #[test]
    fn status_round_trip_strings() {
        assert_eq!(Status::parse(Status::Error.as_str()), Some(Status::Error));
        assert_eq!(Status::from_success(true), Status::Success);
        assert_eq!(Status::parse("warn"), None);
    }

    #[test]
    fn snapshot_entry_flattens() {
        let entry = SnapshotEntry {
            agent: "git".into(),
            snapshot: DiagnosticSnapshot::new("main", None, 0, 0, tree(0, 0, 0)),
        };
        let v = serde_json::to_value(&entry).unwrap();
        assert_eq!(v["agent"], "git");
        assert_eq!(v["local_branch"], "main");
        assert_eq!(v["remote_branch"], serde_json::Value::Null);
    }
}
