//! Versioned persistence format of a [`Match`].
//!
//! Restoring never trusts derived data: the running hand is rebuilt by
//! replaying its plays through the rules, so round results and finished flags
//! are recomputed and an impossible sequence of plays is rejected.

use serde::{Deserialize, Serialize};

use super::{
    constants::{MAX_ROUNDS_PER_HAND, SNAPSHOT_VERSION},
    entities::{Card, Rank, Side},
    errors::GameError,
    hand::Hand,
    round::Round,
    score::Score,
    state_machine::{Match, MatchState},
};

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlaysSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<Card>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b: Option<Card>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoundSnapshot {
    pub plays: PlaysSnapshot,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct HandSnapshot {
    pub vira: Rank,
    pub finished: bool,
    pub rounds: Vec<RoundSnapshot>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MatchSnapshot {
    pub version: u32,
    pub state: MatchState,
    pub points_to_win: u32,
    pub score: Score,
    pub current_hand: Option<HandSnapshot>,
}

impl From<&Round> for RoundSnapshot {
    fn from(round: &Round) -> Self {
        Self {
            plays: PlaysSnapshot {
                a: round.play_of(Side::A),
                b: round.play_of(Side::B),
            },
        }
    }
}

impl From<&Hand> for HandSnapshot {
    fn from(hand: &Hand) -> Self {
        Self {
            vira: hand.vira(),
            finished: hand.is_finished(),
            rounds: hand.rounds().iter().map(RoundSnapshot::from).collect(),
        }
    }
}

fn corrupt(reason: impl Into<String>) -> GameError {
    GameError::CorruptSnapshot(reason.into())
}

impl HandSnapshot {
    fn replay(&self) -> Result<Hand, GameError> {
        if self.rounds.is_empty() || self.rounds.len() > MAX_ROUNDS_PER_HAND {
            return Err(corrupt(format!(
                "hand has {} rounds",
                self.rounds.len()
            )));
        }

        let mut hand = Hand::new(self.vira);
        for plays in self.rounds.iter().map(|round| &round.plays) {
            for (side, card) in [(Side::A, plays.a), (Side::B, plays.b)] {
                if let Some(card) = card {
                    hand.play(side, card)
                        .map_err(|e| corrupt(format!("replaying {card} for side {side}: {e}")))?;
                }
            }
        }

        if hand.rounds_count() != self.rounds.len() {
            return Err(corrupt(format!(
                "hand replays into {} rounds, snapshot lists {}",
                hand.rounds_count(),
                self.rounds.len()
            )));
        }
        Ok(hand)
    }
}

impl Match {
    #[must_use]
    pub fn to_snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            version: SNAPSHOT_VERSION,
            state: self.state(),
            points_to_win: self.points_to_win(),
            score: self.score(),
            current_hand: self.current_hand().map(HandSnapshot::from),
        }
    }

    /// Rebuild a match from its snapshot.
    ///
    /// # Errors
    ///
    /// [`GameError::UnsupportedSnapshot`] for an unknown version,
    /// [`GameError::InvalidPointsToWin`] for a zero threshold and
    /// [`GameError::CorruptSnapshot`] when state, score and hand disagree.
    pub fn from_snapshot(snapshot: &MatchSnapshot) -> Result<Self, GameError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(GameError::UnsupportedSnapshot(snapshot.version));
        }
        if snapshot.points_to_win == 0 {
            return Err(GameError::InvalidPointsToWin);
        }

        let leader = snapshot.score.leader_at(snapshot.points_to_win);
        match (snapshot.state, leader) {
            (MatchState::Finished, None) => {
                return Err(corrupt("finished match without a winner"));
            }
            (MatchState::Waiting | MatchState::InProgress, Some(side)) => {
                return Err(corrupt(format!(
                    "side {side} reached the threshold but the match is {}",
                    snapshot.state
                )));
            }
            _ => {}
        }

        let hand = match (snapshot.state, &snapshot.current_hand) {
            (MatchState::InProgress, Some(hand)) => {
                let hand = hand.replay()?;
                if hand.is_finished() {
                    return Err(corrupt("running hand is already finished"));
                }
                Some(hand)
            }
            (MatchState::InProgress, None) => {
                return Err(corrupt("match in progress without a hand"));
            }
            (_, Some(_)) => {
                return Err(corrupt(format!(
                    "{} match carries a hand",
                    snapshot.state
                )));
            }
            (_, None) => None,
        };

        Ok(Self::from_parts(
            snapshot.points_to_win,
            snapshot.state,
            snapshot.score,
            hand,
        ))
    }

    /// # Errors
    ///
    /// Fails with [`GameError::CorruptSnapshot`] if serialization fails.
    pub fn to_json(&self) -> Result<serde_json::Value, GameError> {
        serde_json::to_value(self.to_snapshot()).map_err(|e| corrupt(e.to_string()))
    }

    /// # Errors
    ///
    /// Fails like [`Match::from_snapshot`], or with
    /// [`GameError::CorruptSnapshot`] for JSON of the wrong shape.
    pub fn from_json(value: serde_json::Value) -> Result<Self, GameError> {
        let snapshot: MatchSnapshot =
            serde_json::from_value(value).map_err(|e| corrupt(e.to_string()))?;
        Self::from_snapshot(&snapshot)
    }
}
