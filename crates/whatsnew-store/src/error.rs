use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("state file must contain a JSON object: {0}")]
    NotAnObject(std::path::PathBuf),

    #[error("{0}")]
    Other(String),
}
