pub mod collector;
pub mod parse;
pub mod repair;
pub mod tracked;

pub use collector::DiagnosticCollector;
pub use parse::{count_lines, parse_left_right_counts, parse_porcelain_status};
pub use repair::{auto_repair_git, GitRepairReport, REPAIR_STEPS};
pub use tracked::{record_diagnostic, run_tracked, GIT_AGENT};
