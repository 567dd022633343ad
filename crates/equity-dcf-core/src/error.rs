use thiserror::Error;

#[derive(Debug, Error)]
pub enum EquityDcfError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for EquityDcfError {
    fn from(e: serde_json::Error) -> Self {
        EquityDcfError::SerializationError(e.to_string())
    }
}
