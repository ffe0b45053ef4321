#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("API key not set (expected in ${0})")]
    MissingApiKey(String),

    #[error("oracle request timed out")]
    Timeout,

    #[error("oracle returned HTTP {0}")]
    Status(u16),

    #[error("oracle transport error: {0}")]
    Transport(String),

    #[error("malformed oracle response: {0}")]
    Malformed(String),

    #[error("oracle returned an empty reply")]
    EmptyReply,
}
