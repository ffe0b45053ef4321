use autopilot_core::{LogEntry, Status};
use autopilot_ledger::LogStore;
use serde::Serialize;

/// Metric name under which scores are stored.
pub const EVAL_METRIC: &str = "eval_score";
/// Metric recorded for every tracked command run.
pub const RUN_METRIC: &str = "run_score";

/// Success ratio over an agent's recent log entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub agent: String,
    /// `successes / max(1, total)`, rounded to two decimals.
    pub score: f64,
    pub successes: usize,
    pub errors: usize,
    pub total: usize,
}

impl Evaluation {
    pub fn status(&self) -> &'static str {
        if self.total == 0 {
            "no_logs"
        } else {
            "ok"
        }
    }
}

pub fn evaluate(agent: &str, logs: &[LogEntry]) -> Evaluation {
    let total = logs.len();
    let successes = logs.iter().filter(|l| l.status == Status::Success).count();
    let raw = successes as f64 / total.max(1) as f64;
    Evaluation {
        agent: agent.to_string(),
        score: (raw * 100.0).round() / 100.0,
        successes,
        errors: total - successes,
        total,
    }
}

/// Score a single command output: `0.0` when it mentions "error" in any
/// case, else `1.0`.
pub fn evaluate_run(output: &str) -> f64 {
    if output.to_lowercase().contains("error") {
        0.0
    } else {
        1.0
    }
}

/// Score `output` with [`evaluate_run`] and store it under [`RUN_METRIC`].
pub fn record_run_score(store: &dyn LogStore, agent: &str, output: &str) -> anyhow::Result<f64> {
    let score = evaluate_run(output);
    store.save_metric(agent, RUN_METRIC, score)?;
    Ok(score)
}

pub fn record_evaluation(store: &dyn LogStore, eval: &Evaluation) -> anyhow::Result<()> {
    store.save_metric(&eval.agent, EVAL_METRIC, eval.score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use autopilot_ledger::MemoryStore;

    fn entry(status: Status) -> LogEntry {
        LogEntry::new("api", "build", status, "", 2000)
    }

    #[test]
    fn score_is_rounded_ratio() {
        let logs = [
            entry(Status::Success),
            entry(Status::Error),
            entry(Status::Success),
        ];
        let e = evaluate("api", &logs);
        assert_eq!(e.score, 0.67);
        assert_eq!((e.successes, e.errors, e.total), (2, 1, 3));
        assert_eq!(e.status(), "ok");
    }

    #[test]
    fn no_logs_scores_zero() {
        let e = evaluate("api", &[]);
        assert_eq!(e.score, 0.0);
        assert_eq!(e.status(), "no_logs");
    }

    #[test]
    fn run_output_keyword() {
        assert_eq!(evaluate_run("Build OK"), 1.0);
        assert_eq!(evaluate_run("TS2304: ERROR cannot find name"), 0.0);
        assert_eq!(evaluate_run(""), 1.0);
    }

    #[test]
    fn recorded_as_metric() {
        let store = MemoryStore::new(2000);
        let e = evaluate("web", &[entry(Status::Success)]);
        record_evaluation(&store, &e).unwrap();
        let m = &store.recent_metrics("web", 1).unwrap()[0];
        assert_eq!(m.metric_name, EVAL_METRIC);
        assert_eq!(m.value, 1.0);
    }

    #[test]
    fn run_score_is_recorded_per_agent() {
        let store = MemoryStore::new(2000);
        assert_eq!(record_run_score(&store, "git", "Already up to date.").unwrap(), 1.0);
        assert_eq!(record_run_score(&store, "git", "fatal: error fetching origin").unwrap(), 0.0);
        let metrics = store.recent_metrics("git", 5).unwrap();
        assert_eq!(metrics.len(), 2);
        assert!(metrics.iter().all(|m| m.metric_name == RUN_METRIC));
        assert_eq!(metrics[1].value, 0.0);
    }
}
