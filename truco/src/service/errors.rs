use thiserror::Error;

use crate::{
    db::RepositoryError,
    game::GameError,
    room::{MatchId, RoomError},
};

/// Anything a use case can fail with.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed input, rejected before any state is loaded.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error("match not found")]
    MatchNotFound(MatchId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Room(#[from] RoomError),

    /// The match actor stopped before answering.
    #[error("match {0} is unavailable")]
    Unavailable(MatchId),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Message safe to hand back to a client.
    pub fn client_message(&self) -> String {
        match self {
            // Storage failures stay in the logs
            ServiceError::Repository(RepositoryError::NotFound(_)) => "match not found".to_string(),
            ServiceError::Repository(_) => "Internal server error".to_string(),
            ServiceError::Unavailable(_) => "match is unavailable".to_string(),
            _ => self.to_string(),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
