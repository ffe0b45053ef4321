use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of error classifications produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorLabel {
    BuildError,
    DependencyError,
    EnvError,
    RuntimeError,
    UnknownError,
}

impl ErrorLabel {
    /// The four actionable labels, in reply-matching priority order.
    pub const KNOWN: [ErrorLabel; 4] = [
        ErrorLabel::BuildError,
        ErrorLabel::DependencyError,
        ErrorLabel::EnvError,
        ErrorLabel::RuntimeError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorLabel::BuildError => "BuildError",
            ErrorLabel::DependencyError => "DependencyError",
            ErrorLabel::EnvError => "EnvError",
            ErrorLabel::RuntimeError => "RuntimeError",
            ErrorLabel::UnknownError => "UnknownError",
        }
    }

    /// Lowercase stem used in artifact file names (`build`, `dependency`, ...).
    pub fn slug(&self) -> &'static str {
        match self {
            ErrorLabel::BuildError => "build",
            ErrorLabel::DependencyError => "dependency",
            ErrorLabel::EnvError => "env",
            ErrorLabel::RuntimeError => "runtime",
            ErrorLabel::UnknownError => "unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ErrorLabel::UnknownError)
    }
}

impl fmt::Display for ErrorLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorLabel {
    type Err = ParseError;

    /// Exact name match, case-insensitive. Accepts the slug form too.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        [
            ErrorLabel::BuildError,
            ErrorLabel::DependencyError,
            ErrorLabel::EnvError,
            ErrorLabel::RuntimeError,
            ErrorLabel::UnknownError,
        ]
        .into_iter()
        .find(|l| l.as_str().eq_ignore_ascii_case(wanted) || l.slug().eq_ignore_ascii_case(wanted))
        .ok_or_else(|| ParseError::UnknownLabel(wanted.to_string()))
    }
}
