#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to serialize record field: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("no record found for slug {0}")]
    NotFound(String),
    #[error("record with slug {0} was concurrently modified, retry")]
    Conflict(String),
}
