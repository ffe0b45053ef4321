//! Source file lookup for patch requests.
//!
//! TypeScript build errors name the failing file as `src/...ts`. Sending
//! that file along with the log lets the oracle produce a diff with real
//! context lines instead of guessed ones.

use autopilot_core::text::truncate_chars;
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;

fn ts_path_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"src[\\/][\w\\/.\-]+\.ts").ok())
        .as_ref()
}

/// A source file quoted into a patch prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSnippet {
    /// Path as named in the log, with `/` separators.
    pub path: String,
    pub content: String,
}

/// Resolves the first `src/...ts` path in a log against a list of
/// directories, first match wins.
#[derive(Debug, Clone)]
pub struct SourceContext {
    search_dirs: Vec<PathBuf>,
    max_chars: usize,
}

impl SourceContext {
    pub fn new(search_dirs: Vec<PathBuf>, max_chars: usize) -> Self {
        Self {
            search_dirs,
            max_chars,
        }
    }

    /// Path of the first TypeScript source named in `log_text`.
    pub fn error_file(log_text: &str) -> Option<String> {
        ts_path_re()
            .and_then(|re| re.find(log_text))
            .map(|m| m.as_str().replace('\\', "/"))
    }

    pub fn lookup(&self, log_text: &str) -> Option<SourceSnippet> {
        let path = Self::error_file(log_text)?;
        for dir in &self.search_dirs {
            let candidate = dir.join(&path);
            match std::fs::read_to_string(&candidate) {
                Ok(content) => {
                    tracing::debug!(file = %candidate.display(), "attaching source to patch prompt");
                    return Some(SourceSnippet {
                        path,
                        content: truncate_chars(&content, self.max_chars),
                    });
                }
                Err(_) => continue,
            }
        }
        tracing::debug!(file = %path, "named source file not found");
        None
    }
}
