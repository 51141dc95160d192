use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::MatchId;

/// Errors raised by the room coordinator.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum RoomError {
    #[error("player token is required")]
    MissingToken,
    #[error("connection already joined match {0}")]
    AlreadyInAnotherMatch(MatchId),
    #[error("match is full")]
    MatchFull,
    #[error("you must join a match first")]
    NotJoined,
    #[error("not all players are ready")]
    NotAllReady,
    #[error("not your turn")]
    NotYourTurn,
    #[error("room not found: {0}")]
    RoomNotFound(MatchId),
}
