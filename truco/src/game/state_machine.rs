//! The match aggregate.
//!
//! A match loops between `Waiting` and `InProgress` once per hand and ends in
//! `Finished` as soon as a side reaches the points needed to win. `Finished`
//! is terminal.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::{
    constants::DEFAULT_POINTS_TO_WIN,
    entities::{Card, Rank, Side},
    errors::GameError,
    hand::{Hand, HandResult},
    round::RoundResult,
    score::Score,
};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    Waiting,
    InProgress,
    Finished,
}

impl MatchState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::InProgress => "in_progress",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for MatchState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MatchState {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(Self::Waiting),
            "in_progress" => Ok(Self::InProgress),
            "finished" => Ok(Self::Finished),
            other => Err(GameError::CorruptSnapshot(format!("unknown state {other}"))),
        }
    }
}

/// What [`Match::start`] did.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StartOutcome {
    Started,
    /// A hand was already running; nothing changed.
    AlreadyInProgress,
}

/// What a single accepted play caused.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PlayOutcome {
    /// Set when the play closed a round.
    pub round: Option<RoundResult>,
    /// Set when the play closed the hand.
    pub hand: Option<HandResult>,
    /// Set when the play ended the match.
    pub match_winner: Option<Side>,
}

impl PlayOutcome {
    #[must_use]
    pub fn hand_completed(&self) -> bool {
        self.hand.is_some()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Match {
    points_to_win: u32,
    state: MatchState,
    score: Score,
    current_hand: Option<Hand>,
}

impl Default for Match {
    fn default() -> Self {
        Self {
            points_to_win: DEFAULT_POINTS_TO_WIN,
            state: MatchState::Waiting,
            score: Score::default(),
            current_hand: None,
        }
    }
}

impl Match {
    /// # Errors
    ///
    /// Fails with [`GameError::InvalidPointsToWin`] for zero.
    pub fn new(points_to_win: u32) -> Result<Self, GameError> {
        if points_to_win == 0 {
            return Err(GameError::InvalidPointsToWin);
        }
        Ok(Self {
            points_to_win,
            ..Self::default()
        })
    }

    pub(super) fn from_parts(
        points_to_win: u32,
        state: MatchState,
        score: Score,
        current_hand: Option<Hand>,
    ) -> Self {
        Self {
            points_to_win,
            state,
            score,
            current_hand,
        }
    }

    #[must_use]
    pub fn points_to_win(&self) -> u32 {
        self.points_to_win
    }

    #[must_use]
    pub fn state(&self) -> MatchState {
        self.state
    }

    #[must_use]
    pub fn score(&self) -> Score {
        self.score
    }

    #[must_use]
    pub fn current_hand(&self) -> Option<&Hand> {
        self.current_hand.as_ref()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state == MatchState::Finished
    }

    /// The side that won the match, once finished.
    #[must_use]
    pub fn winner(&self) -> Option<Side> {
        if self.is_finished() {
            self.score.leader_at(self.points_to_win)
        } else {
            None
        }
    }

    /// Open a new hand with the given vira.
    ///
    /// # Errors
    ///
    /// Fails with [`GameError::MatchFinished`] once the match is over.
    pub fn start(&mut self, vira: Rank) -> Result<StartOutcome, GameError> {
        match self.state {
            MatchState::Finished => Err(GameError::MatchFinished),
            MatchState::InProgress => Ok(StartOutcome::AlreadyInProgress),
            MatchState::Waiting => {
                self.current_hand = Some(Hand::new(vira));
                self.state = MatchState::InProgress;
                Ok(StartOutcome::Started)
            }
        }
    }

    /// Play `card` for `side` in the running hand.
    ///
    /// When the play closes the hand its winner scores a point (a drawn hand
    /// scores nothing), the hand is dropped and the match either waits for
    /// the next hand or finishes.
    ///
    /// # Errors
    ///
    /// Fails with [`GameError::MatchNotInProgress`] without a running hand,
    /// or with the hand's own error for an illegal play.
    pub fn play(&mut self, side: Side, card: Card) -> Result<PlayOutcome, GameError> {
        if self.state != MatchState::InProgress {
            return Err(GameError::MatchNotInProgress);
        }
        let hand = self
            .current_hand
            .as_mut()
            .ok_or(GameError::MatchNotInProgress)?;

        let round = hand.play(side, card)?;
        if !hand.is_finished() {
            return Ok(PlayOutcome {
                round,
                ..PlayOutcome::default()
            });
        }

        let hand_result = hand.result().unwrap_or(HandResult::Drawn);
        if let HandResult::Won(winner) = hand_result {
            self.score = self.score.add_point(winner);
        }
        self.current_hand = None;

        let match_winner = self.score.leader_at(self.points_to_win);
        self.state = if match_winner.is_some() {
            MatchState::Finished
        } else {
            MatchState::Waiting
        };

        Ok(PlayOutcome {
            round,
            hand: Some(hand_result),
            match_winner,
        })
    }
}
