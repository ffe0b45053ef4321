pub mod classify;
pub mod context;
pub mod cycle;
pub mod eval;
pub mod handlers;
pub mod history;
pub mod input;
pub mod patch;
pub mod prompts;
pub mod reflect;

pub use classify::{parse_label, Classifier};
pub use context::{SourceContext, SourceSnippet};
pub use cycle::{Collaborators, CycleOutcome, CycleState, RepairCycle};
pub use eval::{evaluate, evaluate_run, record_evaluation, record_run_score, Evaluation};
pub use handlers::{
    DependencyHandler, EnvHandler, Fix, HandlerSet, OracleDiffHandler, RepairHandler,
    RuntimeHandler,
};
pub use history::FixHistory;
pub use input::read_error_logs;
pub use reflect::reflect;

/// Agent identity under which repair cycles are recorded.
pub const REPAIR_AGENT: &str = "api";
