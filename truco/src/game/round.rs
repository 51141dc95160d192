//! A single trick: one card per side, compared under the hand's vira.

use serde::{Deserialize, Serialize};

use super::{
    entities::{Card, Rank, Side},
    errors::GameError,
    rules::{Outcome, compare},
};

/// Result of a finished round.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum RoundResult {
    Won(Side),
    Tie,
}

impl RoundResult {
    #[must_use]
    pub fn winner(self) -> Option<Side> {
        match self {
            Self::Won(side) => Some(side),
            Self::Tie => None,
        }
    }

    #[must_use]
    pub fn is_tie(self) -> bool {
        matches!(self, Self::Tie)
    }
}

impl From<Outcome> for RoundResult {
    fn from(outcome: Outcome) -> Self {
        outcome.winner().map_or(Self::Tie, Self::Won)
    }
}

/// Round state. Finished exactly when both sides have played.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Round {
    vira: Rank,
    side_a: Option<Card>,
    side_b: Option<Card>,
}

impl Round {
    #[must_use]
    pub fn new(vira: Rank) -> Self {
        Self {
            vira,
            side_a: None,
            side_b: None,
        }
    }

    #[must_use]
    pub fn vira(&self) -> Rank {
        self.vira
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.side_a.is_some() && self.side_b.is_some()
    }

    #[must_use]
    pub fn play_of(&self, side: Side) -> Option<Card> {
        match side {
            Side::A => self.side_a,
            Side::B => self.side_b,
        }
    }

    fn slot_mut(&mut self, side: Side) -> &mut Option<Card> {
        match side {
            Side::A => &mut self.side_a,
            Side::B => &mut self.side_b,
        }
    }

    /// Record `card` for `side`.
    ///
    /// # Errors
    ///
    /// Fails with [`GameError::RoundFinished`] once both sides have played and
    /// with [`GameError::SideAlreadyPlayed`] if `side` already has a card here.
    pub fn play(&mut self, side: Side, card: Card) -> Result<(), GameError> {
        if self.is_finished() {
            return Err(GameError::RoundFinished);
        }

        let slot = self.slot_mut(side);
        if slot.is_some() {
            return Err(GameError::SideAlreadyPlayed(side));
        }
        *slot = Some(card);
        Ok(())
    }

    /// # Errors
    ///
    /// Fails with [`GameError::RoundNotFinished`] while a side has yet to play.
    pub fn result(&self) -> Result<RoundResult, GameError> {
        match (self.side_a, self.side_b) {
            (Some(a), Some(b)) => Ok(compare(a, b, self.vira).into()),
            _ => Err(GameError::RoundNotFinished),
        }
    }
}
