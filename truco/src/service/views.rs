//! Read models handed back by the use cases.

use serde::{Deserialize, Serialize};

use crate::{
    game::{Match, MatchState, PlayOutcome, Rank, Score, Side},
    room::MatchId,
};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreView {
    pub side_a: u32,
    pub side_b: u32,
}

impl From<Score> for ScoreView {
    fn from(score: Score) -> Self {
        Self {
            side_a: score.side_a,
            side_b: score.side_b,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchStateView {
    pub match_id: MatchId,
    pub state: MatchState,
    pub score: ScoreView,
    pub points_to_win: u32,
    /// Vira of the running hand.
    pub vira: Option<Rank>,
    /// Finished rounds of the running hand.
    pub rounds_played: usize,
}

impl MatchStateView {
    pub fn new(match_id: impl Into<MatchId>, game: &Match) -> Self {
        let hand = game.current_hand();
        Self {
            match_id: match_id.into(),
            state: game.state(),
            score: game.score().into(),
            points_to_win: game.points_to_win(),
            vira: hand.map(|hand| hand.vira()),
            rounds_played: hand.map_or(0, |hand| {
                hand.rounds()
                    .iter()
                    .filter(|round| round.is_finished())
                    .count()
            }),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartHandResult {
    pub match_id: MatchId,
    /// The running hand's vira. When the hand was already running this is
    /// its original vira, not the requested one.
    pub vira: Rank,
    /// False when a hand was already running.
    pub started: bool,
    /// Side owing a card in the running hand's open round.
    #[serde(skip)]
    pub awaiting: Option<Side>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlayCardResult {
    pub state: MatchStateView,
    pub outcome: PlayOutcome,
}
