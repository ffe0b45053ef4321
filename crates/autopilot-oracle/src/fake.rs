use crate::error::OracleError;
use crate::Oracle;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays canned replies in order and records every prompt.
/// Once the queue is down to one reply, that reply repeats.
pub struct StaticOracle {
    replies: Mutex<VecDeque<Result<String, OracleError>>>,
    prompts: Mutex<Vec<String>>,
}

impl StaticOracle {
    /// Always answer `reply`.
    pub fn new(reply: &str) -> Self {
        Self::sequence(vec![Ok(reply.to_string())])
    }

    pub fn sequence(replies: Vec<Result<String, OracleError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

impl Oracle for StaticOracle {
    fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        if let Ok(mut p) = self.prompts.lock() {
            p.push(prompt.to_string());
        }
        let mut replies = self
            .replies
            .lock()
            .map_err(|_| OracleError::Transport("static oracle poisoned".into()))?;
        match replies.len() {
            0 => Err(OracleError::EmptyReply),
            1 => replies[0].clone(),
            _ => replies.pop_front().unwrap_or(Err(OracleError::EmptyReply)),
        }
    }
}

/// Fails every call with the same error.
pub struct FailingOracle {
    error: OracleError,
}

impl FailingOracle {
    pub fn new(error: OracleError) -> Self {
        Self { error }
    }
}

impl Default for FailingOracle {
    fn default() -> Self {
        Self::new(OracleError::Transport("connection refused".into()))
    }
}

impl Oracle for FailingOracle {
    fn complete(&self, _prompt: &str) -> Result<String, OracleError> {
        Err(self.error.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_then_repeat_last() {
        let o = StaticOracle::sequence(vec![Ok("a".into()), Ok("b".into())]);
        assert_eq!(o.complete("1").unwrap(), "a");
        assert_eq!(o.complete("2").unwrap(), "b");
        assert_eq!(o.complete("3").unwrap(), "b");
        assert_eq!(o.prompts(), ["1", "2", "3"]);
    }

    #[test]
    fn failing_oracle_always_errs() {
        let o = FailingOracle::new(OracleError::Timeout);
        assert_eq!(o.complete("x"), Err(OracleError::Timeout));
    }
}
