use serde::{Deserialize, Serialize};

use super::entities::Side;

/// Hand points per side.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Score {
    pub side_a: u32,
    pub side_b: u32,
}

impl Score {
    #[must_use]
    pub fn new(side_a: u32, side_b: u32) -> Self {
        Self { side_a, side_b }
    }

    #[must_use]
    pub fn get(&self, side: Side) -> u32 {
        match side {
            Side::A => self.side_a,
            Side::B => self.side_b,
        }
    }

    /// A copy of this score with one more point for `side`.
    #[must_use]
    pub fn add_point(self, side: Side) -> Self {
        match side {
            Side::A => Self::new(self.side_a.saturating_add(1), self.side_b),
            Side::B => Self::new(self.side_a, self.side_b.saturating_add(1)),
        }
    }

    /// The side that has reached `points_to_win`, if any.
    #[must_use]
    pub fn leader_at(&self, points_to_win: u32) -> Option<Side> {
        Side::ALL
            .into_iter()
            .find(|side| self.get(*side) >= points_to_win)
    }
}
