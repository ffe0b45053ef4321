use anyhow::Context;
use autopilot_core::clock::now_compact;
use autopilot_core::ErrorLabel;
use autopilot_exec::{shell_quote, CommandRunner};
use std::path::{Path, PathBuf};

/// Write a validated diff to `<reports_dir>/<label>_fix_<stamp>.patch`.
/// A trailing newline is added when missing; `git apply` rejects a
/// hunk whose last line is unterminated.
pub fn write_patch(reports_dir: &Path, label: ErrorLabel, diff_text: &str) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(reports_dir)
        .with_context(|| format!("cannot create {}", reports_dir.display()))?;
    let path = reports_dir.join(format!("{}_fix_{}.patch", label.slug(), now_compact()));
    let mut text = diff_text.to_string();
    if !text.ends_with('\n') {
        text.push('\n');
    }
    std::fs::write(&path, text).with_context(|| format!("cannot write {}", path.display()))?;
    Ok(path)
}

/// Park a rejected reply at `<logs_dir>/invalid_patch_<label>.txt` for
/// manual review. Overwrites the previous one for the same label.
pub fn quarantine(logs_dir: &Path, label: ErrorLabel, text: &str) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("cannot create {}", logs_dir.display()))?;
    let path = logs_dir.join(format!("invalid_patch_{}.txt", label.slug()));
    std::fs::write(&path, text).with_context(|| format!("cannot write {}", path.display()))?;
    Ok(path)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyResult {
    Applied,
    /// `git apply --check` refused the patch; the tree is untouched.
    CheckFailed(String),
    /// The check passed but the apply itself failed.
    Failed(String),
}

/// `git apply --check` then `git apply`, run from the repository root.
/// No rollback is attempted when the second step fails.
pub fn apply_patch(runner: &dyn CommandRunner, root: &Path, patch: &Path) -> ApplyResult {
    let arg = shell_quote(&display_relative(root, patch));
    let check = runner.run(&format!("git apply --check {arg}"));
    if !check.success {
        return ApplyResult::CheckFailed(check.output);
    }
    let apply = runner.run(&format!("git apply {arg}"));
    if apply.success {
        ApplyResult::Applied
    } else {
        ApplyResult::Failed(apply.output)
    }
}

/// Path relative to `root` when it lies inside it, with `/` separators.
pub fn display_relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
