use thiserror::Error;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal connection error: {0}")]
    Connection(String),

    #[error("journal produce failed: {0}")]
    Produce(String),

    #[error("journal consume failed: {0}")]
    Consume(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unsupported envelope version {found} (max supported {supported})")]
    UnsupportedVersion { found: u8, supported: u8 },

    #[error("journal configuration error: {0}")]
    Config(String),
}
