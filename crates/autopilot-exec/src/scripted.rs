use crate::runner::CommandRunner;
use autopilot_core::CommandResult;
use std::sync::Mutex;

/// Exit code for a command no rule matched, mirroring a shell's "not found".
const EXIT_NOT_SCRIPTED: i32 = 127;

enum Matcher {
    Exact(String),
    Prefix(String),
}

impl Matcher {
    fn matches(&self, command: &str) -> bool {
        match self {
            Matcher::Exact(s) => command == s,
            Matcher::Prefix(p) => command.starts_with(p.as_str()),
        }
    }
}

/// In-process runner that answers from a rule table and records every call.
///
/// Rules are tried in insertion order; the first match wins. Used by tests
/// across the workspace in place of a real shell.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Vec<(Matcher, CommandResult)>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `command` exactly.
    pub fn on(mut self, command: &str, result: CommandResult) -> Self {
        self.rules.push((Matcher::Exact(command.to_string()), result));
        self
    }

    /// Answer any command starting with `prefix`.
    pub fn on_prefix(mut self, prefix: &str, result: CommandResult) -> Self {
        self.rules.push((Matcher::Prefix(prefix.to_string()), result));
        self
    }

    /// Commands received so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn was_called(&self, prefix: &str) -> bool {
        self.calls().iter().any(|c| c.starts_with(prefix))
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, command: &str) -> CommandResult {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(command.to_string());
        }
        self.rules
            .iter()
            .find(|(m, _)| m.matches(command))
            .map(|(_, r)| r.clone())
            .unwrap_or_else(|| {
                CommandResult::failed(format!("command not scripted: {command}"), EXIT_NOT_SCRIPTED)
            })
    }
}
