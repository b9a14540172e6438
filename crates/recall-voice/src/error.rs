use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("LLM request failed: {0}")]
    Llm(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid session event: {0}")]
    InvalidEvent(String),

    #[error("Unsupported session event type: {0}")]
    UnsupportedEvent(String),

    #[error("Session I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
