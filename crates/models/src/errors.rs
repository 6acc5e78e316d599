use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("malformed document: {0}")]
    Decode(String),
    #[error("document could not be encoded: {0}")]
    Encode(String),
}
