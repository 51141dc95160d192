//! Game error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::Side;

/// Errors raised by the rules engine.
///
/// Validation variants (`InvalidCard`, `InvalidRank`, `InvalidSuit`,
/// `InvalidPointsToWin`) are raised before any state is touched. The rest are
/// state conflicts: the aggregate is left exactly as it was.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("invalid card: {0}")]
    InvalidCard(String),
    #[error("invalid rank: {0}")]
    InvalidRank(String),
    #[error("invalid suit: {0}")]
    InvalidSuit(String),
    #[error("pointsToWin must be greater than 0")]
    InvalidPointsToWin,
    #[error("round already finished")]
    RoundFinished,
    #[error("side {0} already played this round")]
    SideAlreadyPlayed(Side),
    #[error("round not finished yet")]
    RoundNotFinished,
    #[error("hand already finished")]
    HandFinished,
    #[error("match already finished")]
    MatchFinished,
    #[error("match not in progress")]
    MatchNotInProgress,
    #[error("unsupported snapshot version {0}")]
    UnsupportedSnapshot(u32),
    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),
}
