use thiserror::Error;

pub type Result<T> = std::result::Result<T, StreamError>;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response body is null")]
    MissingBody,

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Query error: {0}")]
    Query(#[from] weave_query::QueryError),
}
