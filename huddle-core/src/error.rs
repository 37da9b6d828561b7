use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("malformed signal message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid signal message: {0}")]
    Invalid(&'static str),

    #[error("invalid connection id `{0}`")]
    InvalidConnectionId(String),
}
