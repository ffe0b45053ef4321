use autopilot_core::CommandResult;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Exit code reported when the shell itself could not be started.
pub const EXIT_SPAWN_FAILED: i32 = -1;
/// Exit code reported when a command was killed for exceeding its timeout.
pub const EXIT_TIMED_OUT: i32 = 124;

/// Executes one shell command line and reports what happened.
///
/// Implementations never panic and never return an error: every failure
/// mode (non-zero exit, missing binary, spawn failure, timeout) becomes a
/// `CommandResult` with `success == false`.
pub trait CommandRunner {
    fn run(&self, command: &str) -> CommandResult;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, command: &str) -> CommandResult {
        (**self).run(command)
    }
}

impl<T: CommandRunner + ?Sized> CommandRunner for Box<T> {
    fn run(&self, command: &str) -> CommandResult {
        (**self).run(command)
    }
}

/// Runs commands through the platform shell in a fixed working directory.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    cwd: PathBuf,
    timeout: Duration,
}

impl ShellRunner {
    pub fn new(cwd: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            cwd: cwd.into(),
            timeout,
        }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str) -> CommandResult {
        let start = Instant::now();
        let result = run_shell(command, &self.cwd, self.timeout);
        tracing::debug!(
            command,
            exit_code = result.exit_code,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "command finished"
        );
        result
    }
}

#[cfg(windows)]
fn shell_cmd(cmd: &str) -> (&'static str, Vec<String>) {
    ("cmd.exe", vec!["/C".into(), cmd.into()])
}

#[cfg(not(windows))]
fn shell_cmd(cmd: &str) -> (&'static str, Vec<String>) {
    ("sh", vec!["-c".into(), cmd.into()])
}

fn run_shell(cmd: &str, cwd: &Path, timeout: Duration) -> CommandResult {
    let (shell, args) = shell_cmd(cmd);
    let mut child = match Command::new(shell)
        .args(&args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => return CommandResult::failed(format!("spawn error: {e}"), EXIT_SPAWN_FAILED),
    };

    // Drain both pipes on their own threads so a chatty child never blocks
    // on a full pipe while we poll for exit.
    let stdout = child.stdout.take().map(spawn_reader);
    let stderr = child.stderr.take().map(spawn_reader);

    let start = Instant::now();
    let mut timed_out = false;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) => {
                if start.elapsed() >= timeout {
                    timed_out = true;
                    let _ = child.kill();
                    break child.wait().ok();
                }
                thread::sleep(Duration::from_millis(50));
            }
            Err(e) => {
                let _ = child.kill();
                return CommandResult::failed(format!("wait error: {e}"), EXIT_SPAWN_FAILED);
            }
        }
    };

    let mut output = join_reader(stdout);
    output.push_str(&join_reader(stderr));

    if timed_out {
        if !output.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(&format!(
            "command timed out after {}s: {cmd}",
            timeout.as_secs()
        ));
        return CommandResult::failed(output, EXIT_TIMED_OUT);
    }

    match status {
        Some(s) if s.success() => CommandResult::ok(output),
        // Killed by a signal has no code.
        Some(s) => CommandResult::failed(output, s.code().unwrap_or(EXIT_SPAWN_FAILED)),
        None => CommandResult::failed(output, EXIT_SPAWN_FAILED),
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn join_reader(handle: Option<thread::JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

#[cfg(all(test, not(windows)))]
mod tests {
    use super::*;

    fn runner(dir: &Path) -> ShellRunner {
        ShellRunner::new(dir, Duration::from_secs(10))
    }

    #[test]
    fn echo_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let r = runner(dir.path()).run("echo ok");
        assert!(r.success);
        assert_eq!(r.exit_code, 0);
        assert_eq!(r.trimmed(), "ok");
    }

    #[test]
    fn stderr_follows_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let r = runner(dir.path()).run("echo out; echo err 1>&2; exit 3");
        assert!(!r.success);
        assert_eq!(r.exit_code, 3);
        assert_eq!(r.output, "out\nerr\n");
    }

    #[test]
    fn missing_binary_is_a_failed_result() {
        let dir = tempfile::tempdir().unwrap();
        let r = runner(dir.path()).run("definitely-not-a-real-binary-xyz");
        assert!(!r.success);
        assert_ne!(r.exit_code, 0);
        assert!(!r.output.is_empty());
    }

    #[test]
    fn runs_in_cwd() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "here").unwrap();
        let r = runner(dir.path()).run("cat marker.txt");
        assert!(r.success);
        assert_eq!(r.output, "here");
    }

    #[test]
    fn spawn_failure_in_missing_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let r = runner(&dir.path().join("gone")).run("echo ok");
        assert!(!r.success);
        assert_eq!(r.exit_code, EXIT_SPAWN_FAILED);
        assert!(r.output.contains("spawn error"));
    }

    #[test]
    fn timeout_kills() {
        let dir = tempfile::tempdir().unwrap();
        let r = ShellRunner::new(dir.path(), Duration::from_secs(1)).run("sleep 5");
        assert!(!r.success);
        assert_eq!(r.exit_code, EXIT_TIMED_OUT);
        assert!(r.output.contains("timed out"));
    }
}
