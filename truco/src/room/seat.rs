//! Seats, teams and their mapping onto the two sides of the rules engine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::game::entities::Side;

/// One of the four fixed seats of a room.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum SeatId {
    T1A,
    T1B,
    T2A,
    T2B,
}

impl SeatId {
    /// Order in which free seats are handed out.
    pub const ALL: [SeatId; 4] = [Self::T1A, Self::T1B, Self::T2A, Self::T2B];

    /// Play order within a hand, alternating teams.
    pub const TURN_ORDER: [SeatId; 4] = [Self::T1A, Self::T2A, Self::T1B, Self::T2B];

    #[must_use]
    pub fn team(self) -> TeamId {
        match self {
            Self::T1A | Self::T1B => TeamId::T1,
            Self::T2A | Self::T2B => TeamId::T2,
        }
    }

    #[must_use]
    pub fn side(self) -> Side {
        self.team().side()
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::T1A => "T1A",
            Self::T1B => "T1B",
            Self::T2A => "T2A",
            Self::T2B => "T2B",
        }
    }

    fn turn_position(self) -> usize {
        match self {
            Self::T1A => 0,
            Self::T2A => 1,
            Self::T1B => 2,
            Self::T2B => 3,
        }
    }

    /// Seats after this one in turn order, wrapping, ending with itself.
    pub fn turn_successors(self) -> impl Iterator<Item = SeatId> {
        let start = self.turn_position();
        let len = Self::TURN_ORDER.len();
        (1..=len).map(move |step| Self::TURN_ORDER[(start + step) % len])
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum TeamId {
    T1,
    T2,
}

impl TeamId {
    /// `T1` plays as side A, `T2` as side B.
    #[must_use]
    pub fn side(self) -> Side {
        match self {
            Self::T1 => Side::A,
            Self::T2 => Side::B,
        }
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::T1 => "T1",
            Self::T2 => "T2",
        };
        write!(f, "{repr}")
    }
}
