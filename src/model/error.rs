use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("invalid analyzer JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("analyzer reported failure: {0}")]
    Envelope(String),
    #[error("unexpected document shape: {0}")]
    Shape(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
