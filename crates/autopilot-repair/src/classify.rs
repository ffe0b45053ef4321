use crate::prompts;
use autopilot_core::text::tail_chars;
use autopilot_core::ErrorLabel;
use autopilot_oracle::Oracle;

/// Maps log text to an [`ErrorLabel`] through an oracle. Never fails:
/// oracle errors and unusable replies become `UnknownError`.
pub struct Classifier<'a> {
    oracle: &'a dyn Oracle,
    excerpt_chars: usize,
}

impl<'a> Classifier<'a> {
    pub fn new(oracle: &'a dyn Oracle, excerpt_chars: usize) -> Self {
        Self {
            oracle,
            excerpt_chars,
        }
    }

    pub fn classify(&self, log_text: &str) -> ErrorLabel {
        // Error context sits at the end of a build log.
        let excerpt = tail_chars(log_text.trim(), self.excerpt_chars);
        if excerpt.trim().is_empty() {
            return ErrorLabel::UnknownError;
        }

        let reply = match self.oracle.complete(&prompts::classification(excerpt)) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "classification oracle failed");
                return ErrorLabel::UnknownError;
            }
        };
        if let Some(label) = parse_label(&reply) {
            return label;
        }

        tracing::info!(reply = %reply, "reply named no label, re-prompting once");
        match self
            .oracle
            .complete(&prompts::classification_reinforced(excerpt, &reply))
        {
            Ok(second) => parse_label(&second).unwrap_or(ErrorLabel::UnknownError),
            Err(e) => {
                tracing::warn!(error = %e, "classification oracle failed on re-prompt");
                ErrorLabel::UnknownError
            }
        }
    }
}

/// Case-insensitive substring match against the known labels in priority
/// order, then against `UnknownError`. `None` when the reply names nothing.
pub fn parse_label(reply: &str) -> Option<ErrorLabel> {
    let lower = reply.to_lowercase();
    ErrorLabel::KNOWN
        .into_iter()
        .chain([ErrorLabel::UnknownError])
        .find(|l| lower.contains(&l.as_str().to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use autopilot_oracle::{FailingOracle, OracleError, StaticOracle};

    #[test]
    fn parse_priority_order() {
        assert_eq!(parse_label("buildError"), Some(ErrorLabel::BuildError));
        assert_eq!(
            parse_label("RuntimeError or maybe BuildError"),
            Some(ErrorLabel::BuildError)
        );
        assert_eq!(
            parse_label("It is an EnvError."),
            Some(ErrorLabel::EnvError)
        );
        assert_eq!(parse_label("UnknownError"), Some(ErrorLabel::UnknownError));
        assert_eq!(parse_label("no idea"), None);
    }

    #[test]
    fn oracle_failure_is_unknown() {
        let oracle = FailingOracle::default();
        let c = Classifier::new(&oracle, 6000);
        assert_eq!(c.classify("error TS2304"), ErrorLabel::UnknownError);
    }

    #[test]
    fn empty_text_skips_oracle() {
        let oracle = StaticOracle::new("BuildError");
        let c = Classifier::new(&oracle, 6000);
        assert_eq!(c.classify("  \n "), ErrorLabel::UnknownError);
        assert_eq!(oracle.call_count(), 0);
    }

    #[test]
    fn reprompts_once_on_unparseable_reply() {
        let oracle = StaticOracle::sequence(vec![
            Ok("Looks like a compiler problem".into()),
            Ok("BuildError".into()),
        ]);
        let c = Classifier::new(&oracle, 6000);
        assert_eq!(c.classify("error TS2304"), ErrorLabel::BuildError);
        assert_eq!(oracle.call_count(), 2);
        assert!(oracle.prompts()[1].contains("Looks like a compiler problem"));
    }

    #[test]
    fn gives_up_after_one_reprompt() {
        let oracle = StaticOracle::new("hmm");
        let c = Classifier::new(&oracle, 6000);
        assert_eq!(c.classify("weird"), ErrorLabel::UnknownError);
        assert_eq!(oracle.call_count(), 2);
    }

    #[test]
    fn explicit_unknown_is_final() {
        let oracle = StaticOracle::new("UnknownError");
        let c = Classifier::new(&oracle, 6000);
        assert_eq!(c.classify("weird"), ErrorLabel::UnknownError);
        assert_eq!(oracle.call_count(), 1);
    }

    #[test]
    fn reprompt_failure_is_unknown() {
        let oracle = StaticOracle::sequence(vec![Ok("??".into()), Err(OracleError::Timeout)]);
        let c = Classifier::new(&oracle, 6000);
        assert_eq!(c.classify("x"), ErrorLabel::UnknownError);
    }

    #[test]
    fn excerpt_is_the_tail() {
        let oracle = StaticOracle::new("RuntimeError");
        let c = Classifier::new(&oracle, 10);
        let log = format!("{}TAIL-ERROR", "head ".repeat(100));
        c.classify(&log);
        let prompt = &oracle.prompts()[0];
        assert!(prompt.contains("TAIL-ERROR"));
        assert!(!prompt.contains("head head"));
    }
}
