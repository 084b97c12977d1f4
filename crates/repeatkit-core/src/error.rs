use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("instance id must be 1 or greater, got {0}")]
    InvalidInstanceId(i64),

    #[error("malformed instance key in payload: {0:?}")]
    MalformedInstanceKey(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
