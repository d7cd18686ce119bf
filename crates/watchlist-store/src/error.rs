use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("No encontrado")]
    NotFound,

    #[error("Failed to write watchlist file: {0}")]
    Persistence(#[from] std::io::Error),

    #[error("Failed to serialize watchlist: {0}")]
    Serialization(#[from] serde_json::Error),
}
