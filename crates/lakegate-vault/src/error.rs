use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("invalid vault address {0}")]
    InvalidAddress(String),

    #[error("vault request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("vault returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("unexpected vault response: {0}")]
    MalformedResponse(String),
}
