use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, RankingError>;

#[derive(Debug, Error)]
pub enum RankingError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Role catalog error: {0}")]
    Catalog(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("No ranking session for user {0}")]
    SessionNotFound(Uuid),
}

impl From<serde_json::Error> for RankingError {
    fn from(err: serde_json::Error) -> Self {
        RankingError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for RankingError {
    fn from(err: std::io::Error) -> Self {
        RankingError::Catalog(err.to_string())
    }
}

impl From<envy::Error> for RankingError {
    fn from(err: envy::Error) -> Self {
        RankingError::Configuration(err.to_string())
    }
}
