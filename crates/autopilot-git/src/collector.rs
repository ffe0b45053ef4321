use crate::parse::{count_lines, parse_left_right_counts};
use autopilot_core::{DiagnosticSnapshot, TreeCounts};
use autopilot_exec::{shell_quote, CommandRunner};

pub const BRANCH_CMD: &str = "git rev-parse --abbrev-ref HEAD";
pub const UPSTREAM_CMD: &str = "git rev-parse --abbrev-ref --symbolic-full-name @{u}";
pub const STAGED_CMD: &str = "git diff --cached --name-only";
pub const UNSTAGED_CMD: &str = "git diff --name-only";
pub const UNTRACKED_CMD: &str = "git ls-files --others --exclude-standard";

/// Branch name recorded when `HEAD` cannot be resolved.
pub const UNKNOWN_BRANCH: &str = "unknown";

/// Builds a [`DiagnosticSnapshot`] from a fixed sequence of git commands.
///
/// Every step degrades instead of failing: no upstream means untracked,
/// unparsable counts mean zero, a failing listing contributes nothing.
pub struct DiagnosticCollector<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> DiagnosticCollector<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    pub fn collect(&self) -> DiagnosticSnapshot {
        let local = self.local_branch();
        let remote = self.upstream();
        let (ahead, behind) = match &remote {
            Some(upstream) => self.ahead_behind(upstream, &local),
            None => (0, 0),
        };
        let tree = TreeCounts {
            staged: self.count(STAGED_CMD),
            unstaged: self.count(UNSTAGED_CMD),
            untracked: self.count(UNTRACKED_CMD),
        };
        let snapshot = DiagnosticSnapshot::new(local, remote, ahead, behind, tree);
        tracing::debug!(summary = %snapshot.summary(), "diagnostic collected");
        snapshot
    }

    fn local_branch(&self) -> String {
        let r = self.runner.run(BRANCH_CMD);
        let name = r.trimmed();
        if r.success && !name.is_empty() {
            name.to_string()
        } else {
            tracing::warn!(output = r.trimmed(), "cannot resolve local branch");
            UNKNOWN_BRANCH.to_string()
        }
    }

    fn upstream(&self) -> Option<String> {
        let r = self.runner.run(UPSTREAM_CMD);
        let name = r.trimmed();
        (r.success && !name.is_empty()).then(|| name.to_string())
    }

    fn ahead_behind(&self, upstream: &str, local: &str) -> (u32, u32) {
        let cmd = format!(
            "git rev-list --left-right --count {}...{}",
            shell_quote(upstream),
            shell_quote(local)
        );
        let r = self.runner.run(&cmd);
        if !r.success {
            tracing::warn!(output = r.trimmed(), "ahead/behind comparison failed");
            return (0, 0);
        }
        parse_left_right_counts(&r.output)
    }

    fn count(&self, cmd: &str) -> u32 {
        let r = self.runner.run(cmd);
        if r.success {
            count_lines(&r.output)
        } else {
            0
        }
    }
}


#[cfg(all(test, not(windows)))]
mod git_tests {
    use super::*;
    use autopilot_exec::ShellRunner;
    use std::path::Path;
    use std::process::Command;
    use std::time::Duration;

    fn git(dir: &Path, args: &[&str]) -> bool {
        Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Work tree on `main` tracking `origin/main` in a bare sibling repo.
    /// `None` when git is not installed.
    fn tracked_repo(root: &Path) -> Option<std::path::PathBuf> {
        if !git(root, &["--version"]) {
            return None;
        }
        let remote = root.join("remote.git");
        let work = root.join("work");
        std::fs::create_dir_all(&remote).ok()?;
        std::fs::create_dir_all(&work).ok()?;
        let _ = git(&remote, &["init", "--bare", "-q"]);
        let _ = git(&work, &["init", "-q"]);
        let _ = git(&work, &["checkout", "-q", "-b", "main"]);
        let _ = git(&work, &["config", "user.email", "test@test.com"]);
        let _ = git(&work, &["config", "user.name", "Test"]);
        let _ = git(&work, &["config", "commit.gpgsign", "false"]);
        std::fs::write(work.join("README.md"), "hello\n").ok()?;
        let _ = git(&work, &["add", "."]);
        let _ = git(&work, &["commit", "-q", "-m", "init"]);
        let _ = git(&work, &["remote", "add", "origin", "../remote.git"]);
        if !git(&work, &["push", "-q", "-u", "origin", "main"]) {
            return None;
        }
        Some(work)
    }

    #[test]
    fn real_repo_clean_and_synced() {
        let tmp = tempfile::tempdir().unwrap();
        let Some(work) = tracked_repo(tmp.path()) else {
            return;
        };
        let runner = ShellRunner::new(&work, Duration::from_secs(30));
        let s = DiagnosticCollector::new(&runner).collect();
        assert_eq!(s.local_branch, "main");
        assert_eq!(s.remote_branch.as_deref(), Some("origin/main"));
        assert_eq!((s.ahead, s.behind), (0, 0));
        assert_eq!((s.staged_count, s.unstaged_count, s.untracked_count), (0, 0, 0));
        assert!(s.is_tracking && s.is_synced);
    }

    #[test]
    fn real_repo_ahead_and_dirty() {
        let tmp = tempfile::tempdir().unwrap();
        let Some(work) = tracked_repo(tmp.path()) else {
            return;
        };
        std::fs::write(work.join("a.txt"), "a\n").unwrap();
        let _ = git(&work, &["add", "a.txt"]);
        let _ = git(&work, &["commit", "-q", "-m", "local"]);
        std::fs::write(work.join("README.md"), "changed\n").unwrap();
        std::fs::write(work.join("staged.txt"), "s\n").unwrap();
        let _ = git(&work, &["add", "staged.txt"]);
        std::fs::write(work.join("untracked.txt"), "u\n").unwrap();

        let runner = ShellRunner::new(&work, Duration::from_secs(30));
        let s = DiagnosticCollector::new(&runner).collect();
        assert_eq!((s.ahead, s.behind), (1, 0));
        assert!(!s.is_synced);
        assert_eq!((s.staged_count, s.unstaged_count, s.untracked_count), (1, 1, 1));
    }
}
