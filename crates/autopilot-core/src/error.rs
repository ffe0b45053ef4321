use thiserror::Error;

/// Failures when turning user-supplied names into closed enums.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown error label '{0}' (expected BuildError, DependencyError, EnvError, RuntimeError or UnknownError)")]
    UnknownLabel(String),

    #[error("unknown store backend '{0}' (expected jsonl, sqlite, memory or null)")]
    UnknownBackend(String),
}
