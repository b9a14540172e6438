use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("memory store is disabled (no API key configured)")]
    Disabled,

    #[error("memory store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("memory store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed memory store response: {0}")]
    Decode(String),

    #[error("memory store does not support task status queries")]
    StatusUnsupported,
}
