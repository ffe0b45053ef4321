use crate::error::OracleError;
use crate::Oracle;
use autopilot_core::OracleConfig;
use std::time::Duration;

/// Chat-completions client for any OpenAI-compatible endpoint.
pub struct OpenAiOracle {
    agent: ureq::Agent,
    url: String,
    api_key: String,
    model: String,
    temperature: f64,
}

impl OpenAiOracle {
    pub fn new(base_url: &str, api_key: String, model: &str, temperature: f64, timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self {
            agent,
            url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            model: model.to_string(),
            temperature,
        }
    }

    /// Build a client for `model`, reading the key from the configured
    /// environment variable.
    pub fn from_config(config: &OracleConfig, model: &str) -> Result<Self, OracleError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| OracleError::MissingApiKey(config.api_key_env.clone()))?;
        Ok(Self::new(
            &config.base_url,
            api_key,
            model,
            config.temperature,
            Duration::from_secs(config.timeout_secs),
        ))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Oracle for OpenAiOracle {
    fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        let body = request_body(&self.model, self.temperature, prompt);
        let mut resp = self
            .agent
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .send(body.to_string())
            .map_err(map_ureq_error)?;
        let text = resp
            .body_mut()
            .read_to_string()
            .map_err(map_ureq_error)?;
        let reply = parse_chat_response(&text)?;
        tracing::debug!(model = %self.model, chars = reply.len(), "oracle replied");
        Ok(reply)
    }
}

fn map_ureq_error(e: ureq::Error) -> OracleError {
    match e {
        ureq::Error::StatusCode(code) => OracleError::Status(code),
        ureq::Error::Timeout(_) => OracleError::Timeout,
        other => OracleError::Transport(other.to_string()),
    }
}

pub(crate) fn request_body(model: &str, temperature: f64, prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "temperature": temperature,
        "messages": [
            { "role": "user", "content": prompt }
        ],
    })
}

/// Extract `choices[0].message.content`, trimmed.
pub fn parse_chat_response(body: &str) -> Result<String, OracleError> {
    let val: serde_json::Value =
        serde_json::from_str(body).map_err(|e| OracleError::Malformed(e.to_string()))?;
    let content = val
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| OracleError::Malformed("missing choices[0].message.content".into()))?;
    let content = content.trim();
    if content.is_empty() {
        return Err(OracleError::EmptyReply);
    }
    Ok(content.to_string())
}
