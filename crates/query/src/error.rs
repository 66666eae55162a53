use thiserror::Error;

pub type Result<T> = std::result::Result<T, QueryError>;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
