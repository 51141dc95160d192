//! A hand: up to three rounds under one vira, worth at most one point.

use serde::{Deserialize, Serialize};

use super::{
    constants::{MAX_ROUNDS_PER_HAND, ROUND_WINS_FOR_HAND},
    entities::{Card, Rank, Side},
    errors::GameError,
    round::{Round, RoundResult},
};

/// How a finished hand ended.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum HandResult {
    Won(Side),
    /// Every tie-break failed; nobody scores.
    Drawn,
}

impl HandResult {
    #[must_use]
    pub fn winner(self) -> Option<Side> {
        match self {
            Self::Won(side) => Some(side),
            Self::Drawn => None,
        }
    }
}

/// Decide a hand from the results of its finished rounds, in play order.
///
/// Returns `None` while the hand must go on.
///
/// 1. A side with two round wins takes the hand.
/// 2. With two rounds played, a tie in one of them and a win in the other
///    hands the point to the winner of the decisive round.
/// 3. With three rounds played, the first round breaks a tie in the second,
///    the second breaks a tie in the first, and the third breaks a 1-1 split
///    or a double tie. A third tie leaves the hand drawn.
#[must_use]
pub fn resolve(results: &[RoundResult]) -> Option<HandResult> {
    for side in Side::ALL {
        let wins = results
            .iter()
            .filter(|result| result.winner() == Some(side))
            .count();
        if wins >= ROUND_WINS_FOR_HAND {
            return Some(HandResult::Won(side));
        }
    }

    let decided_by = |result: RoundResult| match result {
        RoundResult::Won(side) => HandResult::Won(side),
        RoundResult::Tie => HandResult::Drawn,
    };

    match *results {
        [RoundResult::Won(side), RoundResult::Tie, ..]
        | [RoundResult::Tie, RoundResult::Won(side), ..] => Some(HandResult::Won(side)),
        [RoundResult::Tie, RoundResult::Tie, third] => Some(decided_by(third)),
        [RoundResult::Won(first), RoundResult::Won(second), third] => {
            debug_assert_ne!(first, second, "two wins are caught by the tally");
            Some(decided_by(third))
        }
        _ => None,
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Hand {
    vira: Rank,
    rounds: Vec<Round>,
    finished: bool,
}

impl Hand {
    #[must_use]
    pub fn new(vira: Rank) -> Self {
        Self {
            vira,
            rounds: vec![Round::new(vira)],
            finished: false,
        }
    }

    #[must_use]
    pub fn vira(&self) -> Rank {
        self.vira
    }

    #[must_use]
    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    #[must_use]
    pub fn rounds_count(&self) -> usize {
        self.rounds.len()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn finished_results(&self) -> Vec<RoundResult> {
        self.rounds
            .iter()
            .filter_map(|round| round.result().ok())
            .collect()
    }

    /// The hand's outcome, `None` until it is finished.
    #[must_use]
    pub fn result(&self) -> Option<HandResult> {
        if !self.finished {
            return None;
        }
        resolve(&self.finished_results())
    }

    /// The side that won the hand. `None` while open or when drawn.
    #[must_use]
    pub fn winner(&self) -> Option<Side> {
        self.result().and_then(HandResult::winner)
    }

    /// Side still owing its card in the open round, `None` before the
    /// round's first play or once the hand is over.
    #[must_use]
    pub fn awaiting(&self) -> Option<Side> {
        if self.finished {
            return None;
        }
        let round = self.rounds.last()?;
        match (round.play_of(Side::A), round.play_of(Side::B)) {
            (Some(_), None) => Some(Side::B),
            (None, Some(_)) => Some(Side::A),
            _ => None,
        }
    }

    /// Play `card` for `side` in the current round.
    ///
    /// Returns the round's result when this play closed it.
    ///
    /// # Errors
    ///
    /// Fails with [`GameError::HandFinished`] on a finished hand, or with the
    /// round's own error if the side already played in the current round.
    pub fn play(&mut self, side: Side, card: Card) -> Result<Option<RoundResult>, GameError> {
        if self.finished {
            return Err(GameError::HandFinished);
        }

        let round = self.rounds.last_mut().ok_or(GameError::HandFinished)?;
        round.play(side, card)?;
        if !round.is_finished() {
            return Ok(None);
        }
        let round_result = round.result()?;

        if resolve(&self.finished_results()).is_some() {
            self.finished = true;
        } else if self.rounds.len() < MAX_ROUNDS_PER_HAND {
            self.rounds.push(Round::new(self.vira));
        } else {
            // three rounds with no resolution cannot happen, close it anyway
            self.finished = true;
        }

        Ok(Some(round_result))
    }
}
